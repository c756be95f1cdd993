//! Wire types for the Core API trip endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::LatLngBounds;

pub type TripId = i64;
pub type TowId = i64;

// ============================================================================
// Timestamps
// ============================================================================

/// Lenient timestamp parsing.
///
/// The API writes Python `isoformat()` strings, which carry no offset for
/// naive datetimes. Those are read as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        s.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => parse(&s).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{}'", s))
                }),
                None => Ok(None),
            }
        }
    }
}

// ============================================================================
// Trips and Tows
// ============================================================================

/// Precomputed bounding box of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl TripBounds {
    pub fn to_lat_lng_bounds(&self) -> LatLngBounds {
        LatLngBounds {
            south: self.min_lat,
            west: self.min_lon,
            north: self.max_lat,
            east: self.max_lon,
        }
    }
}

/// One recorded vessel voyage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    /// Internal id of the owning device
    pub device_id: i64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    /// None while the trip is still in progress
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    /// Distance in nautical miles
    #[serde(default)]
    pub distance_nm: Option<f64>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub bounds: Option<TripBounds>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// The trip's name, or "Trip {id}" when unnamed.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Trip {}", self.id),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A labeled sub-segment of a trip, e.g. one fishing drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tow {
    pub id: TowId,
    #[serde(default)]
    pub tow_number: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance_nm: Option<f64>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub avg_depth_m: Option<f64>,
    #[serde(default)]
    pub min_depth_m: Option<f64>,
    #[serde(default)]
    pub max_depth_m: Option<f64>,
}

/// Trip with its tows, from the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(default)]
    pub tows: Vec<Tow>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripsListResponse {
    pub trips: Vec<Trip>,
    pub total: u64,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetailResponse {
    pub trip: TripDetail,
}

/// Optional pagination for the trip list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
