//! Data source seams consumed by the viewer and the trip list.
//!
//! [`crate::http::ApiClient`] implements both traits against the Core API.
//! The returned futures are polled on a single task and need not be `Send`.

use std::future::Future;

use crate::error::Result;
use crate::track::TrackFeatureCollection;
use crate::types::{PageRequest, TripId, TripsListResponse};

/// Fetches one trip's track. No caching, no retries.
pub trait TrackSource {
    fn fetch_track(
        &self,
        trip_id: TripId,
        include_tows: bool,
    ) -> impl Future<Output = Result<TrackFeatureCollection>>;
}

/// Lists the trips recorded by a device.
pub trait TripSource {
    fn list_trips(
        &self,
        device_id: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<TripsListResponse>>;
}
