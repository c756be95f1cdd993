//! # Trip Viewer
//!
//! Glue between the trip list, the selection state machine and the map.
//!
//! Fetches are boxed local futures held in a [`FuturesUnordered`] and polled
//! by whoever drives [`TripViewer::next_resolution`]. A superseded fetch is
//! never aborted; its result comes back tagged with an old ticket and the
//! state machine drops it.

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use log::{debug, info};

use crate::config::MapConfig;
use crate::error::Result;
use crate::map::{MapSurface, MapView, RenderReport};
use crate::selection::{FetchTicket, Resolution, Selection, SelectionState};
use crate::source::TrackSource;
use crate::track::TrackFeatureCollection;
use crate::types::Trip;

type PendingFetch = LocalBoxFuture<'static, (FetchTicket, Result<TrackFeatureCollection>)>;

/// What covers the map while nothing useful can be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Loading,
    Error(String),
}

/// Summary of the selected trip shown beside the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPanel {
    pub title: String,
    pub duration: Option<String>,
    pub distance: Option<String>,
}

impl TripPanel {
    fn for_trip(trip: &Trip) -> Self {
        Self {
            title: trip.display_name(),
            duration: trip
                .duration_hours
                .map(|h| format!("Duration: {:.1} hours", h)),
            distance: trip
                .distance_nm
                .map(|d| format!("Distance: {:.1} nautical miles", d)),
        }
    }
}

pub struct TripViewer<C, S: MapSurface> {
    source: C,
    include_tows: bool,
    selection: Selection,
    map: MapView<S>,
    trip: Option<Trip>,
    in_flight: FuturesUnordered<PendingFetch>,
    last_render: Option<RenderReport>,
}

impl<C, S> TripViewer<C, S>
where
    C: TrackSource + Clone + 'static,
    S: MapSurface,
{
    /// A viewer that requests tows along with each track.
    pub fn new(source: C, map_config: MapConfig) -> Self {
        Self {
            source,
            include_tows: true,
            selection: Selection::new(),
            map: MapView::new(map_config),
            trip: None,
            in_flight: FuturesUnordered::new(),
            last_render: None,
        }
    }

    pub fn with_tows(mut self, include_tows: bool) -> Self {
        self.include_tows = include_tows;
        self
    }

    /// Create the map surface and draw whatever is already loaded.
    pub fn mount<F>(&mut self, create: F) -> bool
    where
        F: FnOnce() -> S,
    {
        let mounted = self.map.mount(create);
        self.sync_map();
        mounted
    }

    pub fn unmount(&mut self) -> Option<S> {
        self.map.unmount()
    }

    /// Select a trip from the list, or clear the selection with `None`.
    pub fn select_trip(&mut self, trip: Option<Trip>) {
        let trip_id = trip.as_ref().map(|t| t.id);
        self.trip = trip;
        if let Some(ticket) = self.selection.select(trip_id) {
            self.dispatch(ticket);
        }
        self.sync_map();
    }

    /// Fetch the selected trip's track again.
    pub fn reload(&mut self) {
        if let Some(ticket) = self.selection.reload() {
            self.dispatch(ticket);
        }
        self.sync_map();
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let source = self.source.clone();
        let include_tows = self.include_tows;
        debug!(
            "[TripViewer] Fetching trip {} (generation {}, {} already in flight)",
            ticket.trip_id,
            ticket.generation,
            self.in_flight.len()
        );
        self.in_flight.push(
            async move {
                let result = source.fetch_track(ticket.trip_id, include_tows).await;
                (ticket, result)
            }
            .boxed_local(),
        );
    }

    /// Wait for the next fetch to finish and apply it.
    ///
    /// `None` when nothing is in flight.
    pub async fn next_resolution(&mut self) -> Option<Resolution> {
        let (ticket, result) = self.in_flight.next().await?;
        let resolution = self.selection.resolve(ticket, result);
        self.sync_map();
        Some(resolution)
    }

    /// Drain every in-flight fetch.
    pub async fn settle(&mut self) {
        while self.next_resolution().await.is_some() {}
    }

    pub fn pending_fetches(&self) -> usize {
        self.in_flight.len()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn map(&self) -> &MapView<S> {
        &self.map
    }

    pub fn selected_trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    /// Report of the most recent map render.
    pub fn last_render(&self) -> Option<&RenderReport> {
        self.last_render.as_ref()
    }

    pub fn overlay(&self) -> Overlay {
        match self.selection.state() {
            SelectionState::Loading { .. } => Overlay::Loading,
            SelectionState::Failed { message, .. } => Overlay::Error(message.clone()),
            SelectionState::Idle | SelectionState::Ready { .. } => Overlay::None,
        }
    }

    pub fn trip_panel(&self) -> Option<TripPanel> {
        self.trip.as_ref().map(TripPanel::for_trip)
    }

    fn sync_map(&mut self) {
        if let Some(report) = self.map.sync(&self.selection) {
            info!(
                "[TripViewer] Map now shows {} lines for {:?}",
                report.lines,
                self.selection.selected_trip_id()
            );
            self.last_render = Some(report);
        }
    }
}
