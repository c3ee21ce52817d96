//! Magnitude-based marker styling.
//!
//! Six fixed color buckets with strict-greater-than thresholds, and a
//! linear radius scale expressed in `L.circle` meters.

use std::fmt;

use serde::Serialize;

/// Meters of circle radius per unit of magnitude.
///
/// Tuned for Leaflet's `L.circle`, whose radius is a ground distance.
/// A pixel-based surface (`L.circleMarker`) needs a different scale.
pub const RADIUS_SCALE: f64 = 41_000.0;

/// Outline color shared by every event marker.
pub const STROKE_COLOR: Color = Color("#000");

/// Outline width in pixels.
pub const STROKE_WEIGHT: f64 = 0.5;

/// Fill opacity of every event marker.
pub const FILL_OPACITY: f64 = 0.6;

/// Color buckets, highest threshold first.
const BUCKETS: [(f64, Color); 5] = [
    (5.0, Color("#F30")),
    (4.0, Color("#F60")),
    (3.0, Color("#F90")),
    (2.0, Color("#FC0")),
    (1.0, Color("#FF0")),
];

/// Color for magnitudes at or below 1, and for anything that fails every comparison (NaN).
const FALLBACK: Color = Color("#9F3");

/// A short `#RGB` hex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Color(&'static str);

impl Color {
    /// The CSS form, e.g. `"#F60"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Expand the short hex form into 8-bit channels.
    ///
    /// Each nibble is doubled, so `#F60` becomes `(255, 102, 0)`.
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        let mut channels = self
            .0
            .trim_start_matches('#')
            .chars()
            .map(|c| {
                c.to_digit(16)
                    .and_then(|d| u8::try_from(d * 17).ok())
                    .unwrap_or(0)
            });
        let r = channels.next().unwrap_or(0);
        let g = channels.next().unwrap_or(0);
        let b = channels.next().unwrap_or(0);
        (r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill color for an event of magnitude `m`.
#[must_use]
pub fn color_for_magnitude(m: f64) -> Color {
    BUCKETS
        .iter()
        .find(|(threshold, _)| m > *threshold)
        .map_or(FALLBACK, |(_, color)| *color)
}

/// Circle radius for an event of magnitude `m`.
///
/// Zero maps to 1 so the marker stays visible. Negative magnitudes are
/// not rejected and produce a negative radius.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn radius_for_magnitude(m: f64) -> f64 {
    if m == 0.0 {
        return 1.0;
    }
    m * RADIUS_SCALE
}

/// Leaflet path options for one event marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    pub radius: f64,
    pub fill_color: Color,
    #[serde(rename = "color")]
    pub stroke_color: Color,
    pub stroke: bool,
    #[serde(rename = "weight")]
    pub stroke_weight: f64,
    pub fill_opacity: f64,
}

impl StyleSpec {
    /// Derive the marker style from a magnitude.
    #[must_use]
    pub fn for_magnitude(m: f64) -> Self {
        Self {
            radius: radius_for_magnitude(m),
            fill_color: color_for_magnitude(m),
            stroke_color: STROKE_COLOR,
            stroke: true,
            stroke_weight: STROKE_WEIGHT,
            fill_opacity: FILL_OPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_at_or_below_one() {
        for m in [-3.0, 0.0, 0.5, 1.0] {
            assert_eq!(color_for_magnitude(m).as_str(), "#9F3", "m = {m}");
        }
    }

    #[test]
    fn test_color_bucket_boundaries_are_strict() {
        let cases = [
            (1.01, "#FF0"),
            (2.0, "#FF0"),
            (2.01, "#FC0"),
            (3.0, "#FC0"),
            (3.5, "#F90"),
            (4.0, "#F90"),
            (4.2, "#F60"),
            (5.0, "#F60"),
            (5.1, "#F30"),
            (9.5, "#F30"),
        ];
        for (m, expected) in cases {
            assert_eq!(color_for_magnitude(m).as_str(), expected, "m = {m}");
        }
    }

    #[test]
    fn test_color_nan_falls_back() {
        assert_eq!(color_for_magnitude(f64::NAN), FALLBACK);
    }

    #[test]
    fn test_radius() {
        assert!((radius_for_magnitude(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((radius_for_magnitude(2.5) - 102_500.0).abs() < 1e-6);
        assert!((radius_for_magnitude(4.2) - 172_200.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_radius_passes_through() {
        assert!((radius_for_magnitude(-0.5) - (-20_500.0)).abs() < 1e-6);
    }

    #[test]
    fn test_style_spec_fixed_fields() {
        let style = StyleSpec::for_magnitude(4.2);
        assert_eq!(style.fill_color.as_str(), "#F60");
        assert_eq!(style.stroke_color.as_str(), "#000");
        assert!(style.stroke);
        assert!((style.stroke_weight - 0.5).abs() < f64::EPSILON);
        assert!((style.fill_opacity - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_style_spec_serializes_as_leaflet_options() {
        let json = serde_json::to_value(StyleSpec::for_magnitude(1.5)).unwrap();
        assert_eq!(json["fillColor"], "#FF0");
        assert_eq!(json["color"], "#000");
        assert_eq!(json["weight"], 0.5);
        assert_eq!(json["fillOpacity"], 0.6);
        assert_eq!(json["stroke"], true);
    }

    #[test]
    fn test_color_rgb() {
        assert_eq!(Color("#F60").rgb(), (255, 102, 0));
        assert_eq!(Color("#9F3").rgb(), (153, 255, 51));
    }
}
