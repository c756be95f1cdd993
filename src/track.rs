//! Track feature collections.
//!
//! A track document is a GeoJSON `FeatureCollection` whose features carry
//! `LineString` geometry in `[lon, lat]` order and a `properties.type` tag of
//! `track` (whole trip) or `tow` (sub-segment). Missing `type` members are
//! tolerated, but a present one must match. Problems inside a single feature
//! stay with that feature: a malformed position invalidates its geometry and
//! unreadable properties leave it untyped, so one bad tow never blanks a trip.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TrackViewError};
use crate::geo_utils::{LatLngBounds, LonLat};
use crate::types::{timestamp, TowId};

/// Raw wire position. Normally `[lon, lat]`, possibly with extra ordinates.
pub type Position = Vec<f64>;

// ============================================================================
// Feature Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Whole-trip path
    Track,
    /// Sub-segment path
    Tow,
    /// Any other tag, drawn as a plain line
    Other,
}

/// Geometry of a single feature, kept as received.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// Null geometry. Legal, renders nothing.
    Empty,
    LineString(Vec<Position>),
    /// Wrong geometry type or coordinates not shaped as positions
    Invalid(String),
}

/// One sounding along the trip track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub depth: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed_knots: Option<f64>,
    #[serde(default)]
    pub course_deg: Option<f64>,
    #[serde(default)]
    pub water_temp: Option<f64>,
}

/// Attributes of a `track` feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackAttributes {
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_count: Option<u64>,
    #[serde(default)]
    pub points: Vec<TrackPoint>,
}

/// Attributes of a `tow` feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TowAttributes {
    #[serde(default)]
    pub tow_id: Option<TowId>,
    #[serde(default)]
    pub tow_number: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub start_time: Option<DateTime<Utc>>,
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

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureAttributes {
    Track(TrackAttributes),
    Tow(TowAttributes),
    Other {
        type_tag: String,
        properties: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackFeature {
    pub geometry: FeatureGeometry,
    pub attributes: FeatureAttributes,
}

impl TrackFeature {
    pub fn kind(&self) -> FeatureKind {
        match self.attributes {
            FeatureAttributes::Track(_) => FeatureKind::Track,
            FeatureAttributes::Tow(_) => FeatureKind::Tow,
            FeatureAttributes::Other { .. } => FeatureKind::Other,
        }
    }

    /// Number of raw positions, valid or not.
    pub fn position_count(&self) -> usize {
        match &self.geometry {
            FeatureGeometry::LineString(positions) => positions.len(),
            _ => 0,
        }
    }

    /// Validated polyline in `[lon, lat]` order.
    ///
    /// `index` is the feature's position in its collection and only labels
    /// the error.
    pub fn lon_lat(&self, index: usize) -> Result<Vec<LonLat>> {
        let positions = match &self.geometry {
            FeatureGeometry::Empty => return Ok(Vec::new()),
            FeatureGeometry::Invalid(message) => {
                return Err(TrackViewError::geometry(index, message.clone()))
            }
            FeatureGeometry::LineString(positions) => positions,
        };

        positions
            .iter()
            .enumerate()
            .map(|(i, position)| match position.as_slice() {
                [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(LonLat::new(*lon, *lat)),
                [_, _, ..] => Err(TrackViewError::geometry(
                    index,
                    format!("position {} has a non-numeric ordinate", i),
                )),
                short => Err(TrackViewError::geometry(
                    index,
                    format!("position {} has {} ordinate(s), expected 2", i, short.len()),
                )),
            })
            .collect()
    }
}

/// Ordered features describing one trip's track and its tows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFeatureCollection {
    pub features: Vec<TrackFeature>,
}

impl TrackFeatureCollection {
    pub fn new(features: Vec<TrackFeature>) -> Self {
        Self { features }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawCollection = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_slice(s.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The whole-trip feature, if the collection has one.
    pub fn track(&self) -> Option<&TrackFeature> {
        self.features.iter().find(|f| f.kind() == FeatureKind::Track)
    }

    pub fn tows(&self) -> impl Iterator<Item = &TrackFeature> {
        self.features.iter().filter(|f| f.kind() == FeatureKind::Tow)
    }

    /// Combined bounds of every feature with valid, non-empty geometry.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.lon_lat(i).ok())
            .filter_map(|points| LatLngBounds::of_polyline(&points))
            .reduce(|acc, b| acc.union(&b))
    }

    fn from_raw(raw: RawCollection) -> Result<Self> {
        if let Some(kind) = raw.kind.as_deref() {
            if kind != "FeatureCollection" {
                return Err(TrackViewError::decode(format!(
                    "expected FeatureCollection, got '{}'",
                    kind
                )));
            }
        }

        let features = raw
            .features
            .into_iter()
            .enumerate()
            .map(|(i, f)| feature_from_raw(i, f))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { features })
    }
}

// ============================================================================
// Wire Decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    coordinates: Value,
}

fn feature_from_raw(index: usize, raw: RawFeature) -> Result<TrackFeature> {
    if let Some(kind) = raw.kind.as_deref() {
        if kind != "Feature" {
            return Err(TrackViewError::decode(format!(
                "feature {}: expected Feature, got '{}'",
                index, kind
            )));
        }
    }

    let properties = raw.properties.unwrap_or_default();
    let type_tag = properties
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let typed = match type_tag.as_str() {
        "track" => Some(attributes_from(&properties).map(FeatureAttributes::Track)),
        "tow" => Some(attributes_from(&properties).map(FeatureAttributes::Tow)),
        _ => None,
    };
    let attributes = match typed {
        Some(Ok(attributes)) => attributes,
        Some(Err(e)) => {
            warn!(
                "[TrackFeatureCollection] Feature {} has unreadable {} properties, drawing it plain: {}",
                index, type_tag, e
            );
            FeatureAttributes::Other {
                type_tag,
                properties,
            }
        }
        None => FeatureAttributes::Other {
            type_tag,
            properties,
        },
    };

    Ok(TrackFeature {
        geometry: geometry_from_raw(raw.geometry),
        attributes,
    })
}

fn attributes_from<T: serde::de::DeserializeOwned>(
    properties: &Map<String, Value>,
) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(properties.clone()))
}

fn geometry_from_raw(raw: Option<RawGeometry>) -> FeatureGeometry {
    let Some(geometry) = raw else {
        return FeatureGeometry::Empty;
    };
    // An untyped geometry is read as a LineString when its coordinates allow
    match geometry.kind.as_deref() {
        None | Some("LineString") => {}
        Some(other) => {
            return FeatureGeometry::Invalid(format!("unsupported geometry type '{}'", other))
        }
    }
    match positions_from_value(&geometry.coordinates) {
        Some(positions) => FeatureGeometry::LineString(positions),
        None => FeatureGeometry::Invalid("coordinates are not an array of positions".to_string()),
    }
}

// Non-numeric ordinates become NaN so validation reports them per feature.
fn positions_from_value(value: &Value) -> Option<Vec<Position>> {
    value
        .as_array()?
        .iter()
        .map(|position| {
            position.as_array().map(|ordinates| {
                ordinates
                    .iter()
                    .map(|o| o.as_f64().unwrap_or(f64::NAN))
                    .collect()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_JSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[-70.5, 42.3], [-70.45, 42.32], [-70.4, 42.35]]},
                "properties": {
                    "type": "track",
                    "start_time": "2024-05-01T06:30:00",
                    "end_time": "2024-05-01T18:00:00",
                    "points_count": 3,
                    "points": [
                        {"timestamp": "2024-05-01T06:30:00", "depth": 40.5, "latitude": 42.3, "longitude": -70.5,
                         "speed_knots": 3.1, "course_deg": 90.0, "water_temp": null}
                    ]
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[-70.48, 42.31], [-70.46, 42.33]]},
                "properties": {"type": "tow", "tow_id": 70, "tow_number": 1, "name": "First set",
                               "avg_depth_m": 0.0, "duration_hours": 2.5}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"type": "tow", "tow_id": 71, "tow_number": null}
            }
        ]
    }"#;

    #[test]
    fn test_decode_track_document() {
        let collection = TrackFeatureCollection::from_json_str(TRACK_JSON).unwrap();
        assert_eq!(collection.len(), 3);

        let track = collection.track().unwrap();
        assert_eq!(track.position_count(), 3);
        match &track.attributes {
            FeatureAttributes::Track(attrs) => {
                assert_eq!(attrs.points_count, Some(3));
                assert_eq!(attrs.points.len(), 1);
                assert_eq!(attrs.points[0].depth, Some(40.5));
                assert!(attrs.points[0].water_temp.is_none());
            }
            other => panic!("unexpected attributes {:?}", other),
        }

        let tows: Vec<_> = collection.tows().collect();
        assert_eq!(tows.len(), 2);
        match &tows[0].attributes {
            FeatureAttributes::Tow(attrs) => {
                assert_eq!(attrs.tow_id, Some(70));
                assert_eq!(attrs.avg_depth_m, Some(0.0));
            }
            other => panic!("unexpected attributes {:?}", other),
        }
        assert_eq!(tows[1].geometry, FeatureGeometry::Empty);
        assert!(tows[1].lon_lat(2).unwrap().is_empty());
    }

    #[test]
    fn test_lon_lat_order_preserved() {
        let collection = TrackFeatureCollection::from_json_str(TRACK_JSON).unwrap();
        let points = collection.features[0].lon_lat(0).unwrap();
        assert_eq!(points[0], LonLat::new(-70.5, 42.3));
        assert_eq!(points[2], LonLat::new(-70.4, 42.35));
    }

    #[test]
    fn test_collection_bounds() {
        let collection = TrackFeatureCollection::from_json_str(TRACK_JSON).unwrap();
        let bounds = collection.bounds().unwrap();
        assert_eq!(bounds.south, 42.3);
        assert_eq!(bounds.north, 42.35);
        assert_eq!(bounds.west, -70.5);
        assert_eq!(bounds.east, -70.4);
        assert!(TrackFeatureCollection::default().bounds().is_none());
    }

    #[test]
    fn test_malformed_position_is_per_feature() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[-70.5, 42.3], [-70.4]]},
             "properties": {"type": "track"}},
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[-70.5, null]]},
             "properties": {"type": "tow"}},
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[-70.5, 42.3]]},
             "properties": {"type": "tow"}}
        ]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert_eq!(collection.len(), 3);

        let err = collection.features[0].lon_lat(0).unwrap_err();
        assert!(matches!(err, TrackViewError::Geometry { feature_index: 0, .. }));
        assert!(err.to_string().contains("position 1 has 1 ordinate"));

        assert!(collection.features[1].lon_lat(1).is_err());
        assert_eq!(collection.features[2].lon_lat(2).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_geometry_kept_as_invalid() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-70.5, 42.3]},
             "properties": {"type": "track"}}
        ]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert!(matches!(
            collection.features[0].geometry,
            FeatureGeometry::Invalid(_)
        ));
        assert!(collection.features[0].lon_lat(0).is_err());
    }

    #[test]
    fn test_unknown_type_tag() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null, "properties": {"type": "haul", "weight_kg": 120}},
            {"type": "Feature", "geometry": null}
        ]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert_eq!(collection.features[0].kind(), FeatureKind::Other);
        match &collection.features[0].attributes {
            FeatureAttributes::Other {
                type_tag,
                properties,
            } => {
                assert_eq!(type_tag, "haul");
                assert!(properties.contains_key("weight_kg"));
            }
            other => panic!("unexpected attributes {:?}", other),
        }
        assert_eq!(collection.features[1].kind(), FeatureKind::Other);
    }

    #[test]
    fn test_shape_mismatch_is_decode_error() {
        let not_collection = r#"{"type": "Feature", "features": []}"#;
        assert!(matches!(
            TrackFeatureCollection::from_json_str(not_collection),
            Err(TrackViewError::Decode { .. })
        ));

        let missing_features = r#"{"type": "FeatureCollection"}"#;
        assert!(matches!(
            TrackFeatureCollection::from_json_str(missing_features),
            Err(TrackViewError::Decode { .. })
        ));

        let bad_feature = r#"{"type": "FeatureCollection", "features": [
            {"type": "Polygon", "geometry": null, "properties": {"type": "track"}}
        ]}"#;
        assert!(matches!(
            TrackFeatureCollection::from_json_str(bad_feature),
            Err(TrackViewError::Decode { .. })
        ));

        assert!(TrackFeatureCollection::from_json_str("<html>").is_err());
    }

    #[test]
    fn test_untyped_document_decodes() {
        let json = r#"{"features": [{"geometry": {"coordinates": [[-70.5, 42.3], [-70.4, 42.35]]},
            "properties": {"type": "track", "points_count": 2}}]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert_eq!(collection.len(), 1);

        let track = collection.track().unwrap();
        assert_eq!(
            track.lon_lat(0).unwrap(),
            vec![LonLat::new(-70.5, 42.3), LonLat::new(-70.4, 42.35)]
        );
        match &track.attributes {
            FeatureAttributes::Track(attrs) => assert_eq!(attrs.points_count, Some(2)),
            other => panic!("unexpected attributes {:?}", other),
        }
    }

    #[test]
    fn test_untyped_geometry_without_positions_is_invalid() {
        let json = r#"{"features": [{"geometry": {"coordinates": 5}, "properties": {"type": "tow"}}]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert!(matches!(
            collection.features[0].geometry,
            FeatureGeometry::Invalid(_)
        ));
    }

    #[test]
    fn test_unreadable_properties_are_per_feature() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[-70.5, 42.3], [-70.4, 42.35]]},
             "properties": {"type": "track", "points_count": 2}},
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[-70.48, 42.31], [-70.46, 42.33]]},
             "properties": {"type": "tow", "tow_id": 70, "start_time": "bogus"}},
            {"type": "Feature", "geometry": null,
             "properties": {"type": "track", "points": [{"timestamp": "later", "latitude": 42.3, "longitude": -70.5}]}}
        ]}"#;
        let collection = TrackFeatureCollection::from_json_str(json).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.features[0].kind(), FeatureKind::Track);

        match &collection.features[1].attributes {
            FeatureAttributes::Other {
                type_tag,
                properties,
            } => {
                assert_eq!(type_tag, "tow");
                assert_eq!(properties.get("tow_id").and_then(Value::as_i64), Some(70));
            }
            other => panic!("unexpected attributes {:?}", other),
        }
        assert_eq!(collection.features[1].lon_lat(1).unwrap().len(), 2);
        assert_eq!(collection.features[2].kind(), FeatureKind::Other);
    }
}
