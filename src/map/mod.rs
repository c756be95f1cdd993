//! # Map Render Engine
//!
//! Two independent lifecycles over one [`MapSurface`]:
//!
//! - **Surface**: created once per [`MapView`], positioned at the configured
//!   initial view with a base tile layer, and torn down on unmount.
//! - **Track layer**: every change of the current track removes the previous
//!   [`TrackLayer`] in full (lines and endpoint markers) before anything new
//!   is added. Layers are replaced, never merged.
//!
//! Geometry crosses from `[lon, lat]` to `(lat, lng)` here and nowhere else.

use log::{debug, info, warn};

use crate::config::MapConfig;
use crate::error::TrackViewError;
use crate::geo_utils::{LatLng, LatLngBounds};
use crate::selection::Selection;
use crate::track::{FeatureKind, TrackFeatureCollection};

pub mod scene;
pub mod style;

pub use scene::SceneSurface;
pub use style::{LineStyle, MarkerStyle, Popup};

// ============================================================================
// Surface Abstraction
// ============================================================================

/// Handle of a layer on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineLayer {
    pub points: Vec<LatLng>,
    pub style: LineStyle,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    pub position: LatLng,
    pub style: MarkerStyle,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tiles(TileLayer),
    Polyline(PolylineLayer),
    CircleMarker(CircleMarker),
}

/// Visible center and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

/// A drawable map backend.
pub trait MapSurface {
    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn viewport(&self) -> Viewport;

    fn add_layer(&mut self, layer: Layer) -> LayerId;

    fn remove_layer(&mut self, id: LayerId);

    /// Adjust the view so `bounds` is visible with `padding` pixels on each side.
    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64);

    /// Tear down the surface. No calls follow.
    fn remove(&mut self);
}

// ============================================================================
// Map View
// ============================================================================

/// Layers drawn for one track, removed together.
#[derive(Debug, Default)]
struct TrackLayer {
    layer_ids: Vec<LayerId>,
    bounds: Option<LatLngBounds>,
}

/// What a render pass drew.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub lines: usize,
    pub markers: usize,
    /// Features skipped for malformed geometry
    pub skipped: Vec<TrackViewError>,
    /// Bounds the view was fitted to, if any
    pub fitted: Option<LatLngBounds>,
}

pub struct MapView<S: MapSurface> {
    config: MapConfig,
    surface: Option<S>,
    destroyed: bool,
    tiles: Option<LayerId>,
    track_layer: Option<TrackLayer>,
    rendered_revision: Option<u64>,
}

impl<S: MapSurface> MapView<S> {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            surface: None,
            destroyed: false,
            tiles: None,
            track_layer: None,
            rendered_revision: None,
        }
    }

    /// Create the surface. Only the first call on a view does anything.
    ///
    /// Returns whether `create` was called.
    pub fn mount<F>(&mut self, create: F) -> bool
    where
        F: FnOnce() -> S,
    {
        if self.destroyed {
            warn!("[MapView] Mount after unmount ignored");
            return false;
        }
        if self.surface.is_some() {
            debug!("[MapView] Already mounted");
            return false;
        }

        let mut surface = create();
        surface.set_view(self.config.center, self.config.zoom);
        let tiles = surface.add_layer(Layer::Tiles(TileLayer {
            url_template: self.config.tile_url.clone(),
            attribution: self.config.attribution.clone(),
            max_zoom: self.config.tile_max_zoom,
        }));
        info!(
            "[MapView] Mounted at ({}, {}) zoom {}",
            self.config.center.lat, self.config.center.lng, self.config.zoom
        );

        self.tiles = Some(tiles);
        self.surface = Some(surface);
        self.rendered_revision = None;
        true
    }

    /// Remove all layers and tear down the surface, returning it.
    ///
    /// The view cannot be mounted again afterwards.
    pub fn unmount(&mut self) -> Option<S> {
        let mut surface = self.surface.take()?;
        if let Some(layer) = self.track_layer.take() {
            for id in layer.layer_ids {
                surface.remove_layer(id);
            }
        }
        if let Some(tiles) = self.tiles.take() {
            surface.remove_layer(tiles);
        }
        surface.remove();
        self.destroyed = true;
        self.rendered_revision = None;
        info!("[MapView] Unmounted");
        Some(surface)
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Bounds of the currently drawn track, if any geometry was drawn.
    pub fn track_bounds(&self) -> Option<LatLngBounds> {
        self.track_layer.as_ref().and_then(|layer| layer.bounds)
    }

    /// Re-render when the selection's track changed since the last render.
    pub fn sync(&mut self, selection: &Selection) -> Option<RenderReport> {
        if self.surface.is_none() {
            return None;
        }
        let revision = selection.track_revision();
        if self.rendered_revision == Some(revision) {
            return None;
        }
        let report = self.render(selection.current_track());
        self.rendered_revision = Some(revision);
        report
    }

    /// Replace the track layer with one drawn from `track`.
    ///
    /// `None` or an empty collection only removes the previous layer; the
    /// view is left where it is. Returns `None` when not mounted.
    pub fn render(&mut self, track: Option<&TrackFeatureCollection>) -> Option<RenderReport> {
        let Some(surface) = self.surface.as_mut() else {
            debug!("[MapView] Render skipped, not mounted");
            return None;
        };

        if let Some(previous) = self.track_layer.take() {
            debug!(
                "[MapView] Removing previous track layer ({} layers)",
                previous.layer_ids.len()
            );
            for id in previous.layer_ids {
                surface.remove_layer(id);
            }
        }

        let mut report = RenderReport::default();
        let Some(track) = track else {
            return Some(report);
        };

        let mut layer = TrackLayer::default();
        for (index, feature) in track.features.iter().enumerate() {
            let points = match feature.lon_lat(index) {
                Ok(points) => points,
                Err(e) => {
                    warn!("[MapView] Skipping feature: {}", e);
                    report.skipped.push(e);
                    continue;
                }
            };
            if points.is_empty() {
                continue;
            }

            let kind = feature.kind();
            let lat_lngs: Vec<LatLng> = points.iter().map(|p| p.to_lat_lng()).collect();
            let (first, last) = (lat_lngs[0], lat_lngs[lat_lngs.len() - 1]);

            layer.layer_ids.push(surface.add_layer(Layer::Polyline(PolylineLayer {
                points: lat_lngs,
                style: LineStyle::for_kind(kind),
                popup: style::popup_for(feature),
            })));
            report.lines += 1;

            if kind == FeatureKind::Track {
                layer.layer_ids.push(surface.add_layer(Layer::CircleMarker(CircleMarker {
                    position: first,
                    style: MarkerStyle::start(),
                    popup: Some(Popup::titled("Trip Start")),
                })));
                layer.layer_ids.push(surface.add_layer(Layer::CircleMarker(CircleMarker {
                    position: last,
                    style: MarkerStyle::end(),
                    popup: Some(Popup::titled("Trip End")),
                })));
                report.markers += 2;
            }

            if let Some(bounds) = LatLngBounds::of_polyline(&points) {
                layer.bounds = Some(match layer.bounds {
                    Some(acc) => acc.union(&bounds),
                    None => bounds,
                });
            }
        }

        if let Some(bounds) = layer.bounds.filter(|b| b.is_valid()) {
            surface.fit_bounds(&bounds, self.config.fit_padding);
            report.fitted = Some(bounds);
        }

        debug!(
            "[MapView] Rendered {} lines, {} markers, {} skipped",
            report.lines,
            report.markers,
            report.skipped.len()
        );
        self.track_layer = Some(layer);
        Some(report)
    }
}

impl<S: MapSurface> Drop for MapView<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
