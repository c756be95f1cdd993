//! HTTP client for the DeckBrain Core API.
//!
//! One GET per call with a 30 second timeout. No caching, no retries, no
//! authentication. Non-success statuses become [`TrackViewError::Network`]
//! carrying the status code; bodies that do not parse become
//! [`TrackViewError::Decode`].

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{Result, TrackViewError};
use crate::source::{TrackSource, TripSource};
use crate::track::TrackFeatureCollection;
use crate::types::{PageRequest, TowId, TripDetail, TripDetailResponse, TripId, TripsListResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// URL Builders
// ============================================================================

fn parse_url(raw: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| TrackViewError::config(format!("invalid request URL '{}': {}", raw, e)))?;
    // An empty query_pairs_mut() would still leave a trailing '?'
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// `/api/trips?device_id=..` with `limit`/`offset` only when set.
pub fn trips_url(base: &str, device_id: &str, page: PageRequest) -> Result<Url> {
    let mut params = vec![("device_id", device_id.to_string())];
    if let Some(limit) = page.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(offset) = page.offset {
        params.push(("offset", offset.to_string()));
    }
    parse_url(&format!("{}/api/trips", base), &params)
}

pub fn trip_url(base: &str, trip_id: TripId) -> Result<Url> {
    parse_url(&format!("{}/api/trips/{}", base, trip_id), &[])
}

/// The track endpoint. `include_tows=true` is sent only when requested.
pub fn track_url(base: &str, trip_id: TripId, include_tows: bool) -> Result<Url> {
    let mut params = Vec::new();
    if include_tows {
        params.push(("include_tows", "true".to_string()));
    }
    parse_url(&format!("{}/api/trips/{}/track", base, trip_id), &params)
}

pub fn tow_track_url(base: &str, trip_id: TripId, tow_id: TowId) -> Result<Url> {
    parse_url(
        &format!("{}/api/trips/{}/tows/{}/track", base, trip_id, tow_id),
        &[],
    )
}

// ============================================================================
// Client
// ============================================================================

/// Read-only client for trips, trip details and track geometry.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackViewError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List trips recorded by `device_id`, newest first as the server orders them.
    pub async fn get_trips(&self, device_id: &str, page: PageRequest) -> Result<TripsListResponse> {
        let url = trips_url(&self.base_url, device_id, page)?;
        let response: TripsListResponse = self.get_json("trips", url).await?;
        info!(
            "[ApiClient] Listed {} of {} trips for {}",
            response.trips.len(),
            response.total,
            device_id
        );
        Ok(response)
    }

    /// Trip metadata with its tows.
    pub async fn get_trip_detail(&self, trip_id: TripId) -> Result<TripDetail> {
        let url = trip_url(&self.base_url, trip_id)?;
        let response: TripDetailResponse = self.get_json("trip", url).await?;
        Ok(response.trip)
    }

    /// Track geometry of a trip, optionally with one feature per tow.
    pub async fn get_trip_track(
        &self,
        trip_id: TripId,
        include_tows: bool,
    ) -> Result<TrackFeatureCollection> {
        let url = track_url(&self.base_url, trip_id, include_tows)?;
        let body = self.get_bytes("trip track", url).await?;
        let track = TrackFeatureCollection::from_json_slice(&body)?;
        info!(
            "[ApiClient] Trip {} track: {} features",
            trip_id,
            track.len()
        );
        Ok(track)
    }

    /// Track geometry of a single tow.
    pub async fn get_tow_track(
        &self,
        trip_id: TripId,
        tow_id: TowId,
    ) -> Result<TrackFeatureCollection> {
        let url = tow_track_url(&self.base_url, trip_id, tow_id)?;
        let body = self.get_bytes("tow track", url).await?;
        TrackFeatureCollection::from_json_slice(&body)
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &str, url: Url) -> Result<T> {
        let body = self.get_bytes(what, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_bytes(&self, what: &str, url: Url) -> Result<Vec<u8>> {
        debug!("[ApiClient] GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                let status = e.status().map(|s| s.as_u16());
                TrackViewError::network(what, e, status)
            })?;
        let response = check_status(what, response)?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TrackViewError::network(what, e, None))?;
        Ok(body.to_vec())
    }
}

fn check_status(what: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status.canonical_reason().unwrap_or(status.as_str());
    warn!("[ApiClient] {} request failed: {}", what, status);
    Err(TrackViewError::network(what, reason, Some(status.as_u16())))
}

impl TrackSource for ApiClient {
    async fn fetch_track(&self, trip_id: TripId, include_tows: bool) -> Result<TrackFeatureCollection> {
        self.get_trip_track(trip_id, include_tows).await
    }
}

impl TripSource for ApiClient {
    async fn list_trips(&self, device_id: &str, page: PageRequest) -> Result<TripsListResponse> {
        self.get_trips(device_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000";

    #[test]
    fn test_trips_url() {
        let url = trips_url(BASE, "test-vessel-001", PageRequest::default()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/trips?device_id=test-vessel-001"
        );

        let page = PageRequest {
            limit: Some(20),
            offset: Some(40),
        };
        let url = trips_url(BASE, "vessel 7", page).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/trips?device_id=vessel+7&limit=20&offset=40"
        );
    }

    #[test]
    fn test_track_url_include_tows() {
        assert_eq!(
            track_url(BASE, 42, true).unwrap().as_str(),
            "http://localhost:8000/api/trips/42/track?include_tows=true"
        );
        assert_eq!(
            track_url(BASE, 42, false).unwrap().as_str(),
            "http://localhost:8000/api/trips/42/track"
        );
    }

    #[test]
    fn test_detail_and_tow_urls() {
        assert_eq!(
            trip_url(BASE, 7).unwrap().as_str(),
            "http://localhost:8000/api/trips/7"
        );
        assert_eq!(
            tow_track_url(BASE, 7, 70).unwrap().as_str(),
            "http://localhost:8000/api/trips/7/tows/70/track"
        );
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = ApiConfig::new("not a url", "vessel-7");
        assert!(matches!(
            ApiClient::new(&config),
            Err(TrackViewError::Config { .. })
        ));
    }

    #[test]
    fn test_client_trims_base() {
        let client = ApiClient::new(&ApiConfig::new("http://core:8000/", "vessel-7")).unwrap();
        assert_eq!(client.base_url(), "http://core:8000");
    }

    #[test]
    fn test_detail_response_unwraps_trip() {
        let body = br#"{"trip": {"id": 7, "device_id": 1, "start_time": "2024-05-01T06:00:00",
            "tows": [{"id": 70, "tow_number": 1, "start_time": "2024-05-01T07:00:00"}]}}"#;
        let response: TripDetailResponse = serde_json::from_slice(body).unwrap();
        assert_eq!(response.trip.trip.id, 7);
        assert_eq!(response.trip.tows.len(), 1);
        assert_eq!(response.trip.tows[0].tow_number, Some(1));
    }
}
