//! In-memory map surface.
//!
//! Records layers in insertion order and computes fit-to-bounds views the way
//! a slippy map does: Web Mercator projection, 256 px tiles, largest integer
//! zoom at which the padded bounds fit the viewport.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::debug;

use super::{CircleMarker, Layer, LayerId, MapSurface, PolylineLayer, TileLayer, Viewport};
use crate::geo_utils::{LatLng, LatLngBounds};

const TILE_SIZE: f64 = 256.0;
/// Latitude limit of the Web Mercator projection
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

pub struct SceneSurface {
    width: f64,
    height: f64,
    min_zoom: f64,
    max_zoom: f64,
    viewport: Viewport,
    layers: BTreeMap<LayerId, Layer>,
    next_id: u64,
    removed: bool,
}

impl SceneSurface {
    /// A surface of `width` x `height` pixels.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            min_zoom: 0.0,
            max_zoom: 19.0,
            viewport: Viewport {
                center: LatLng::new(0.0, 0.0),
                zoom: 0.0,
            },
            layers: BTreeMap::new(),
            next_id: 1,
            removed: false,
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&LayerId, &Layer)> {
        self.layers.iter()
    }

    pub fn tile_layers(&self) -> Vec<&TileLayer> {
        self.layers
            .values()
            .filter_map(|l| match l {
                Layer::Tiles(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn polylines(&self) -> Vec<&PolylineLayer> {
        self.layers
            .values()
            .filter_map(|l| match l {
                Layer::Polyline(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn markers(&self) -> Vec<&CircleMarker> {
        self.layers
            .values()
            .filter_map(|l| match l {
                Layer::CircleMarker(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Largest integer zoom at which `bounds` fits inside the padded viewport.
    pub fn bounds_zoom(&self, bounds: &LatLngBounds, padding: f64) -> f64 {
        let avail_w = (self.width - 2.0 * padding).max(1.0);
        let avail_h = (self.height - 2.0 * padding).max(1.0);
        let dx = mercator_x(bounds.east) - mercator_x(bounds.west);
        let dy = mercator_y(bounds.south) - mercator_y(bounds.north);

        let fit = |span: f64, avail: f64| {
            if span > 0.0 {
                (avail / (TILE_SIZE * span)).log2()
            } else {
                f64::INFINITY
            }
        };
        let zoom = fit(dx, avail_w).min(fit(dy, avail_h));
        if zoom.is_infinite() {
            return self.max_zoom;
        }
        zoom.floor().clamp(self.min_zoom, self.max_zoom)
    }
}

impl Default for SceneSurface {
    fn default() -> Self {
        Self::new(800.0, 400.0)
    }
}

impl MapSurface for SceneSurface {
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.viewport = Viewport {
            center,
            zoom: zoom.clamp(self.min_zoom, self.max_zoom),
        };
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        if self.removed {
            debug!("[SceneSurface] Layer added after removal dropped");
        } else {
            self.layers.insert(id, layer);
        }
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.layers.remove(&id);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) {
        if self.removed || !bounds.is_valid() {
            return;
        }
        let zoom = self.bounds_zoom(bounds, padding);
        let mid_y = (mercator_y(bounds.north) + mercator_y(bounds.south)) / 2.0;
        let center = LatLng::new(inverse_mercator_y(mid_y), (bounds.west + bounds.east) / 2.0);
        self.set_view(center, zoom);
    }

    fn remove(&mut self) {
        self.layers.clear();
        self.removed = true;
    }
}

/// Longitude to normalized x in [0, 1].
fn mercator_x(lng: f64) -> f64 {
    (lng + 180.0) / 360.0
}

/// Latitude to normalized y in [0, 1], growing southward.
fn mercator_y(lat: f64) -> f64 {
    let sin = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();
    0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)
}

fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
}
