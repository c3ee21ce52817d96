//! Earthquake point layer construction.
//!
//! A [`GeoJsonLayerBuilder`] walks raw feed features in order and hands
//! each one to two injected strategies: one that writes the popup, one
//! that produces the marker. The defaults style markers by magnitude.

use serde::Serialize;

use crate::errors::QuakemapError;
use crate::models::{EarthquakeFeature, Feature};
use crate::style::StyleSpec;

/// A geographic point in Leaflet's (lat, lng) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Popup shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub place: String,
    pub time: String,
    pub magnitude: f64,
}

impl Popup {
    /// Render the popup body as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            "<strong>Place:</strong> {}<br>\n<strong>Time:</strong> {}<br>\n<strong>Magnitude:</strong> {}",
            escape_html(&self.place),
            escape_html(&self.time),
            self.magnitude
        )
    }
}

/// Marker geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Circle,
}

/// One rendered event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub shape: MarkerShape,
    pub style: StyleSpec,
    /// Popup body (HTML)
    pub popup: String,
}

/// An ordered group of markers, toggled as one overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointLayer {
    pub markers: Vec<Marker>,
}

impl PointLayer {
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Produces the popup for a feature.
pub trait PopupContent: Send + Sync {
    fn popup(&self, feature: &EarthquakeFeature) -> Popup;
}

impl<F> PopupContent for F
where
    F: Fn(&EarthquakeFeature) -> Popup + Send + Sync,
{
    fn popup(&self, feature: &EarthquakeFeature) -> Popup {
        self(feature)
    }
}

/// Produces the marker for a feature at its position.
///
/// The returned marker's popup is overwritten by the builder.
pub trait MarkerFactory: Send + Sync {
    fn marker(&self, feature: &EarthquakeFeature, at: LatLng) -> Marker;
}

impl<F> MarkerFactory for F
where
    F: Fn(&EarthquakeFeature, LatLng) -> Marker + Send + Sync,
{
    fn marker(&self, feature: &EarthquakeFeature, at: LatLng) -> Marker {
        self(feature, at)
    }
}

/// Builds a [`PointLayer`] from raw feed features.
pub struct GeoJsonLayerBuilder<P, M> {
    popup_content: P,
    marker_factory: M,
}

impl<P: PopupContent, M: MarkerFactory> GeoJsonLayerBuilder<P, M> {
    pub fn new(popup_content: P, marker_factory: M) -> Self {
        Self {
            popup_content,
            marker_factory,
        }
    }

    /// Convert every feature into a marker, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns the first validation error; no partial layer is produced.
    pub fn build(&self, features: &[Feature]) -> Result<PointLayer, QuakemapError> {
        let markers = features
            .iter()
            .map(|raw| {
                let feature = EarthquakeFeature::try_from(raw)?;
                let at = LatLng::new(feature.latitude(), feature.longitude());
                let mut marker = self.marker_factory.marker(&feature, at);
                marker.popup = self.popup_content.popup(&feature).to_html();
                Ok(marker)
            })
            .collect::<Result<Vec<_>, QuakemapError>>()?;

        tracing::debug!("built point layer with {} markers", markers.len());
        Ok(PointLayer { markers })
    }
}

/// Popup with place, UTC time and magnitude.
#[must_use]
pub fn describe_event(feature: &EarthquakeFeature) -> Popup {
    let time = feature
        .datetime()
        .map_or_else(|| "unknown".into(), |t| t.format("%a %b %d %Y %H:%M:%S UTC").to_string());

    Popup {
        place: feature.place.clone(),
        time,
        magnitude: feature.magnitude,
    }
}

/// Circle sized and colored by magnitude.
#[must_use]
pub fn magnitude_circle(feature: &EarthquakeFeature, at: LatLng) -> Marker {
    Marker {
        position: at,
        shape: MarkerShape::Circle,
        style: StyleSpec::for_magnitude(feature.magnitude),
        popup: String::new(),
    }
}

/// Build the earthquake overlay with the default strategies.
///
/// # Errors
///
/// Returns an error if any feature lacks a magnitude or coordinates.
pub fn earthquake_layer(features: &[Feature]) -> Result<PointLayer, QuakemapError> {
    GeoJsonLayerBuilder::new(describe_event, magnitude_circle).build(features)
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
