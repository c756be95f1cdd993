//! Geographic utilities: coordinate order conversion and bounding boxes.
//!
//! Wire geometry is `[lon, lat]`; everything that touches the map is
//! `(lat, lng)`. The conversion happens exactly once, in [`LonLat::to_lat_lng`].

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

/// A map coordinate in (latitude, longitude) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A validated wire position in (longitude, latitude) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    fn to_coord(self) -> Coord {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Bounds of a `geo` rectangle whose x is longitude and y is latitude.
    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        }
    }

    /// Bounds of a polyline, `None` when it has no points.
    pub fn of_polyline(points: &[LonLat]) -> Option<Self> {
        let line = LineString::new(points.iter().map(|p| p.to_coord()).collect());
        line.bounding_rect().map(Self::from_rect)
    }

    /// Smallest bounds containing both.
    pub fn union(&self, other: &LatLngBounds) -> Self {
        Self {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    /// Finite and non-inverted. A single point is a valid (zero-area) box.
    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && self.west <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}
