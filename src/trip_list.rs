//! # Trip List Presenter
//!
//! Lists the trips of one device and turns a click into a selected [`Trip`].
//! The list is fetched once per mount and knows nothing about track state.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::ApiConfig;
use crate::source::TripSource;
use crate::types::{PageRequest, Trip, TripId};

#[derive(Debug, Clone, PartialEq)]
pub enum TripListState {
    Loading,
    Failed(String),
    Empty,
    Populated(Vec<Trip>),
}

/// One display row.
#[derive(Debug, Clone, PartialEq)]
pub struct TripListEntry {
    pub trip_id: TripId,
    pub title: String,
    pub started: String,
    pub duration: Option<String>,
    pub distance: Option<String>,
    pub selected: bool,
}

pub struct TripList {
    api_url: String,
    device_id: String,
    page: PageRequest,
    state: TripListState,
    loaded: bool,
}

impl TripList {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            device_id: config.default_device_id.clone(),
            page: PageRequest::default(),
            state: TripListState::Loading,
            loaded: false,
        }
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn state(&self) -> &TripListState {
        &self.state
    }

    /// Fetch the list. Only the first call after a mount reaches the source.
    pub async fn load<S: TripSource>(&mut self, source: &S) -> &TripListState {
        if self.loaded {
            return &self.state;
        }
        self.loaded = true;
        self.state = TripListState::Loading;

        self.state = match source.list_trips(&self.device_id, self.page).await {
            Ok(response) if response.trips.is_empty() => {
                info!("[TripList] No trips for {}", self.device_id);
                TripListState::Empty
            }
            Ok(response) => {
                info!(
                    "[TripList] Loaded {} trips for {}",
                    response.trips.len(),
                    self.device_id
                );
                TripListState::Populated(response.trips)
            }
            Err(e) => {
                warn!("[TripList] Failed to load trips: {}", e);
                TripListState::Failed(e.to_string())
            }
        };
        &self.state
    }

    /// Forget the fetched list so the next `load` fetches again.
    pub fn remount(&mut self) {
        self.loaded = false;
        self.state = TripListState::Loading;
    }

    /// Troubleshooting line shown under a load failure.
    pub fn hint(&self) -> Option<String> {
        match self.state {
            TripListState::Failed(_) => Some(format!(
                "Make sure the Core API is running at {}",
                self.api_url
            )),
            _ => None,
        }
    }

    pub fn trips(&self) -> &[Trip] {
        match &self.state {
            TripListState::Populated(trips) => trips,
            _ => &[],
        }
    }

    pub fn entries(&self, selected: Option<TripId>) -> Vec<TripListEntry> {
        self.trips()
            .iter()
            .map(|trip| TripListEntry {
                trip_id: trip.id,
                title: trip.display_name(),
                started: format_start(trip.start_time),
                duration: trip.duration_hours.map(|h| format!("{:.1}h", h)),
                distance: trip.distance_nm.map(|d| format!("{:.1} nm", d)),
                selected: selected == Some(trip.id),
            })
            .collect()
    }

    /// The trip to hand to the viewer, `None` for ids not in the list.
    pub fn select(&self, trip_id: TripId) -> Option<Trip> {
        let trip = self.trips().iter().find(|t| t.id == trip_id).cloned();
        if trip.is_none() {
            warn!("[TripList] Trip {} is not listed", trip_id);
        }
        trip
    }
}

fn format_start(time: DateTime<Utc>) -> String {
    time.format("%b %-d, %Y %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TrackViewError};
    use crate::types::TripsListResponse;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};

    struct FakeTrips {
        response: Result<TripsListResponse>,
        calls: Cell<u32>,
        last_request: RefCell<Option<(String, PageRequest)>>,
    }

    impl FakeTrips {
        fn new(response: Result<TripsListResponse>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
                last_request: RefCell::new(None),
            }
        }
    }

    impl TripSource for FakeTrips {
        async fn list_trips(&self, device_id: &str, page: PageRequest) -> Result<TripsListResponse> {
            self.calls.set(self.calls.get() + 1);
            *self.last_request.borrow_mut() = Some((device_id.to_string(), page));
            self.response.clone()
        }
    }

    fn trip(id: TripId, name: Option<&str>) -> Trip {
        Trip {
            id,
            device_id: 1,
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap(),
            end_time: None,
            name: name.map(str::to_string),
            distance_nm: Some(0.0),
            duration_hours: Some(11.5),
            bounds: None,
            created_at: None,
        }
    }

    fn listed(trips: Vec<Trip>) -> Result<TripsListResponse> {
        Ok(TripsListResponse {
            total: trips.len() as u64,
            trips,
            device_id: Some("vessel-7".to_string()),
        })
    }

    fn config() -> ApiConfig {
        ApiConfig::new("http://core:8000", "vessel-7")
    }

    #[tokio::test]
    async fn test_load_populates_once() {
        let source = FakeTrips::new(listed(vec![trip(42, Some("Georges Bank")), trip(43, None)]));
        let page = PageRequest {
            limit: Some(20),
            offset: None,
        };
        let mut list = TripList::new(&config()).with_page(page);
        assert_eq!(list.state(), &TripListState::Loading);

        list.load(&source).await;
        list.load(&source).await;
        assert_eq!(source.calls.get(), 1);
        assert_eq!(
            source.last_request.borrow().clone(),
            Some(("vessel-7".to_string(), page))
        );
        assert_eq!(list.trips().len(), 2);

        list.remount();
        list.load(&source).await;
        assert_eq!(source.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_entries_format() {
        let source = FakeTrips::new(listed(vec![trip(42, Some("Georges Bank")), trip(43, None)]));
        let mut list = TripList::new(&config());
        list.load(&source).await;

        let entries = list.entries(Some(43));
        assert_eq!(entries[0].title, "Georges Bank");
        assert_eq!(entries[0].started, "May 1, 2024 6:30 AM");
        assert_eq!(entries[0].duration.as_deref(), Some("11.5h"));
        assert_eq!(entries[0].distance.as_deref(), Some("0.0 nm"));
        assert!(!entries[0].selected);
        assert_eq!(entries[1].title, "Trip 43");
        assert!(entries[1].selected);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let source = FakeTrips::new(listed(Vec::new()));
        let mut list = TripList::new(&config());
        assert_eq!(list.load(&source).await, &TripListState::Empty);
        assert!(list.entries(None).is_empty());
        assert!(list.hint().is_none());
    }

    #[tokio::test]
    async fn test_failure_shows_hint() {
        let source = FakeTrips::new(Err(TrackViewError::network(
            "trips",
            "Service Unavailable",
            Some(503),
        )));
        let mut list = TripList::new(&config());
        list.load(&source).await;

        assert_eq!(
            list.state(),
            &TripListState::Failed("Failed to fetch trips: Service Unavailable".to_string())
        );
        assert_eq!(
            list.hint().as_deref(),
            Some("Make sure the Core API is running at http://core:8000")
        );
    }

    #[tokio::test]
    async fn test_select_emits_known_trips_only() {
        let source = FakeTrips::new(listed(vec![trip(42, None)]));
        let mut list = TripList::new(&config());
        assert!(list.select(42).is_none());

        list.load(&source).await;
        assert_eq!(list.select(42).map(|t| t.id), Some(42));
        assert!(list.select(7).is_none());
    }
}
