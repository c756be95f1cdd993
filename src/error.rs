//! Unified error handling for the deckview pipeline.
//!
//! Network and decode failures are produced by the track data client and are
//! folded into the selection state as `Failed`. Geometry errors are per-feature
//! and never abort a render. A stale response is not an error at all, see
//! [`crate::selection::Resolution::Stale`].

use thiserror::Error;

/// Unified error type for deckview operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackViewError {
    /// Transport failure or non-success HTTP status
    #[error("{message}")]
    Network {
        message: String,
        status_code: Option<u16>,
    },

    /// Payload did not parse into the expected shape
    #[error("Invalid response: {message}")]
    Decode { message: String },

    /// A single feature carried malformed coordinates
    #[error("Feature {feature_index} has invalid geometry: {message}")]
    Geometry {
        feature_index: usize,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TrackViewError {
    /// Build a network error for a failed request of `what` (e.g. "trip track").
    pub fn network(what: &str, reason: impl std::fmt::Display, status_code: Option<u16>) -> Self {
        TrackViewError::Network {
            message: format!("Failed to fetch {}: {}", what, reason),
            status_code,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        TrackViewError::Decode {
            message: message.into(),
        }
    }

    pub fn geometry(feature_index: usize, message: impl Into<String>) -> Self {
        TrackViewError::Geometry {
            feature_index,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        TrackViewError::Config {
            message: message.into(),
        }
    }

    /// HTTP status code, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TrackViewError::Network { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TrackViewError {
    fn from(err: serde_json::Error) -> Self {
        TrackViewError::decode(err.to_string())
    }
}

/// Result type alias for deckview operations.
pub type Result<T> = std::result::Result<T, TrackViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackViewError::network("trip track", "Not Found", Some(404));
        assert_eq!(err.to_string(), "Failed to fetch trip track: Not Found");
        assert_eq!(err.status_code(), Some(404));

        let err = TrackViewError::geometry(3, "position 0 has 1 ordinate");
        assert_eq!(
            err.to_string(),
            "Feature 3 has invalid geometry: position 0 has 1 ordinate"
        );
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_from_serde_error() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: TrackViewError = parse.unwrap_err().into();
        assert!(matches!(err, TrackViewError::Decode { .. }));
        assert!(err.to_string().starts_with("Invalid response"));
    }
}
