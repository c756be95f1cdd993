//! # deckview
//!
//! Trip selection and track rendering for the DeckBrain dashboard.
//!
//! This library provides:
//! - A client for the Core API's trip, trip detail and track endpoints
//! - A selection state machine that keeps out-of-order responses off the map
//! - A map render engine that owns one replaceable track layer
//! - A trip list presenter and a viewer that ties the pieces together
//!
//! ## Features
//!
//! - **`http`** - Enable the reqwest client for the Core API (default)
//! - **`cli`** - Build the `deckview` command-line viewer
//!
//! ## Quick Start
//!
//! ```rust
//! use deckview::{MapConfig, MapView, SceneSurface, Selection, TrackFeatureCollection};
//!
//! let track = TrackFeatureCollection::from_json_str(r#"{
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "geometry": {"type": "LineString", "coordinates": [[-70.5, 42.3], [-70.4, 42.35]]},
//!         "properties": {"type": "track"}
//!     }]
//! }"#).unwrap();
//!
//! let mut selection = Selection::new();
//! let mut map = MapView::new(MapConfig::default());
//! map.mount(SceneSurface::default);
//!
//! let ticket = selection.select(Some(42)).unwrap();
//! selection.resolve(ticket, Ok(track));
//!
//! let report = map.sync(&selection).unwrap();
//! assert_eq!(report.lines, 1);
//! assert_eq!(report.markers, 2);
//! ```

// Unified error handling
pub mod error;
pub use error::{Result, TrackViewError};

// API and map configuration
pub mod config;
pub use config::{ApiConfig, MapConfig};

// Coordinate and bounds types
pub mod geo_utils;
pub use geo_utils::{LatLng, LatLngBounds, LonLat};

// Trip and tow records from the Core API
pub mod types;
pub use types::{PageRequest, Tow, TowId, Trip, TripDetail, TripId, TripsListResponse};

// Track GeoJSON decoding
pub mod track;
pub use track::{FeatureKind, TrackFeature, TrackFeatureCollection};

// Data source traits
pub mod source;
pub use source::{TrackSource, TripSource};

// Selection state machine
pub mod selection;
pub use selection::{FetchTicket, Resolution, Selection, SelectionState, Status};

// Map render engine
pub mod map;
pub use map::{MapSurface, MapView, RenderReport, SceneSurface};

// Trip list presenter
pub mod trip_list;
pub use trip_list::{TripList, TripListEntry, TripListState};

// Viewer tying selection, fetches and the map together
pub mod viewer;
pub use viewer::{Overlay, TripPanel, TripViewer};

// HTTP client (optional)
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::ApiClient;
