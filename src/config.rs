//! Map configuration.
//!
//! Built once from the command line and handed to the composer; nothing
//! reads configuration from global state.

use std::time::Duration;

use crate::client::FeedType;
use crate::layers::LatLng;

/// Tectonic plate boundaries (PB2002, Bird 2003).
pub const PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

/// Mapbox raster tile template; `{id}` selects the style.
pub const TILE_URL_TEMPLATE: &str =
    "https://api.tiles.mapbox.com/v4/{id}/{z}/{x}/{y}.png?access_token={accessToken}";

pub const TILE_ATTRIBUTION: &str = "Map data &copy; <a href=\"https://www.openstreetmap.org/\">OpenStreetMap</a> contributors, \
<a href=\"https://creativecommons.org/licenses/by-sa/2.0/\">CC-BY-SA</a>, Imagery \u{a9} <a href=\"https://www.mapbox.com/\">Mapbox</a>";

pub const MAX_ZOOM: u8 = 18;

/// Initial map center, over the western United States.
pub const INITIAL_CENTER: LatLng = LatLng::new(40.5, -115.0);

pub const INITIAL_ZOOM: f64 = 2.5;

/// Everything the composer needs to build a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Credential substituted into every tile URL
    pub access_token: String,
    pub earthquake_feed_url: String,
    pub plates_url: String,
    pub tile_url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub center: LatLng,
    pub zoom: f64,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub view: ViewOptions,
}

/// Layer selection applied on top of the composed map's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Base layer to show instead of the default
    pub base_layer: Option<String>,
    /// Overlays to start hidden
    pub hidden_overlays: Vec<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            earthquake_feed_url: FeedType::default().url(),
            plates_url: PLATES_URL.to_string(),
            tile_url_template: TILE_URL_TEMPLATE.to_string(),
            attribution: TILE_ATTRIBUTION.to_string(),
            max_zoom: MAX_ZOOM,
            center: INITIAL_CENTER,
            zoom: INITIAL_ZOOM,
            timeout: None,
            view: ViewOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert!(config.earthquake_feed_url.ends_with("/summary/all_week.geojson"));
        assert_eq!(config.center, LatLng::new(40.5, -115.0));
        assert!((config.zoom - 2.5).abs() < f64::EPSILON);
        assert!(config.timeout.is_none());
    }
}
