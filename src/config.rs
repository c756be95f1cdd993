//! Configuration for the Core API client and the map view.
//!
//! Both values are supplied from outside the pipeline. Defaults can be
//! overridden through environment variables.

use url::Url;

use crate::error::{Result, TrackViewError};
use crate::geo_utils::LatLng;

/// Environment variable holding the Core API base URL.
pub const API_URL_ENV: &str = "DECKBRAIN_API_URL";
/// Environment variable holding the device whose trips are listed.
pub const DEVICE_ID_ENV: &str = "DECKBRAIN_DEFAULT_DEVICE_ID";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_DEVICE_ID: &str = "test-vessel-001";

/// Where the Core API lives and which device to browse.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub api_url: String,
    pub default_device_id: String,
}

impl ApiConfig {
    pub fn new(api_url: &str, default_device_id: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            default_device_id: default_device_id.to_string(),
        }
    }

    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let device_id = std::env::var(DEVICE_ID_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string());
        Self::new(&api_url, &device_id)
    }

    /// Check that the base URL is an absolute http(s) URL and a device is set.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            TrackViewError::config(format!(
                "API URL must be an absolute http(s) URL, got '{}': {}",
                self.api_url, reason
            ))
        };
        let url = Url::parse(&self.api_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("unsupported scheme"));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        if self.default_device_id.trim().is_empty() {
            return Err(TrackViewError::config("device id must not be empty"));
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Initial view and base layer of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Initial center, over the northeast US coast fishing grounds
    pub center: LatLng,
    pub zoom: f64,
    /// Tile URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub tile_url: String,
    pub attribution: String,
    pub tile_max_zoom: u8,
    /// Padding in pixels applied on every side when fitting to a track
    pub fit_padding: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(42.3, -70.5),
            zoom: 8.0,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            tile_max_zoom: 19,
            fit_padding: 50.0,
        }
    }
}
