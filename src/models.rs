//! Data models for the two GeoJSON feeds.
//!
//! The earthquake structures follow the USGS summary feed format. The
//! plate boundary structures accept any line or polygon collection and
//! serialize back to GeoJSON unchanged.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuakemapError;

/// Top-level GeoJSON response from the earthquake feed.
#[derive(Debug, Clone, Deserialize)]
pub struct EarthquakeFeed {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,

    /// Earthquake events
    pub features: Vec<Feature>,
}

impl EarthquakeFeed {
    /// Validate the response structure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` unless the type is `FeatureCollection`.
    pub fn validate(&self) -> Result<(), QuakemapError> {
        expect_collection(&self.type_)
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// When this feed was generated (ms since epoch)
    pub generated: i64,

    /// Human-readable title
    pub title: String,

    /// Number of events in response
    pub count: usize,
}

/// A single raw earthquake record as it appears in the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Event ID, used only to name the record in errors
    #[serde(default)]
    pub id: Option<String>,

    pub geometry: Geometry,

    pub properties: Properties,
}

/// Point geometry of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// The event properties the map reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: i64,
}

/// A validated earthquake, ready to be turned into a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeFeature {
    pub place: String,
    /// Event time (ms since epoch)
    pub time: i64,
    pub magnitude: f64,
    /// (longitude, latitude)
    pub coordinates: (f64, f64),
}

impl EarthquakeFeature {
    /// Get the event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time).single()
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.coordinates.0
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.coordinates.1
    }
}

impl TryFrom<&Feature> for EarthquakeFeature {
    type Error = QuakemapError;

    fn try_from(f: &Feature) -> Result<Self, Self::Error> {
        let name = f.id.as_deref().unwrap_or("<unnamed>");

        let magnitude = f
            .properties
            .mag
            .ok_or_else(|| QuakemapError::Validation(format!("{name}: missing magnitude")))?;

        let (lon, lat) = match f.geometry.coordinates.as_slice() {
            [lon, lat, ..] => (*lon, *lat),
            other => {
                return Err(QuakemapError::Validation(format!(
                    "{name}: expected at least 2 coordinates, got {}",
                    other.len()
                )));
            }
        };

        Ok(Self {
            place: f
                .properties
                .place
                .clone()
                .unwrap_or_else(|| "Unknown location".into()),
            time: f.properties.time,
            magnitude,
            coordinates: (lon, lat),
        })
    }
}

/// A GeoJSON position; extra elements (elevation) are preserved.
pub type Position = Vec<f64>;

/// Plate boundary feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateBoundaries {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<PlateBoundaryFeature>,
}

impl PlateBoundaries {
    /// A collection with no boundaries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            type_: "FeatureCollection".into(),
            features: Vec::new(),
        }
    }

    /// Validate the response structure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` unless the type is `FeatureCollection`.
    pub fn validate(&self) -> Result<(), QuakemapError> {
        expect_collection(&self.type_)
    }
}

/// One boundary segment or plate outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateBoundaryFeature {
    /// Always "Feature"
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: BoundaryGeometry,

    /// Passed through to the renderer untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Line or polygon geometry of a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum BoundaryGeometry {
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl BoundaryGeometry {
    /// Number of vertices across all parts.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::LineString(line) => line.len(),
            Self::MultiLineString(lines) | Self::Polygon(lines) => lines.iter().map(Vec::len).sum(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().map(Vec::len).sum(),
        }
    }
}

fn expect_collection(type_: &str) -> Result<(), QuakemapError> {
    if type_ != "FeatureCollection" {
        return Err(QuakemapError::InvalidResponse(format!(
            "expected type 'FeatureCollection', got '{type_}'"
        )));
    }
    Ok(())
}
