//! Map composition.
//!
//! [`Map::compose`] assembles base layers, overlays, the initial view,
//! the layer switcher and the legend into one map. The plate boundary
//! overlay is loaded in the background and appears whenever it resolves.

use std::future::Future;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::{MapConfig, ViewOptions};
use crate::errors::QuakemapError;
use crate::layers::{LatLng, PointLayer};
use crate::legend::Legend;
use crate::models::PlateBoundaries;
use crate::plates::{self, LayerGroup};

pub const SATELLITE: &str = "Satellite";
pub const GRAYSCALE: &str = "Grayscale";
pub const OUTDOORS: &str = "Outdoors";

pub const EARTHQUAKES: &str = "Earthquakes";
pub const TECTONIC_PLATES: &str = "TectonicPlates";

/// Base layers in switcher order: (name, tile style id).
const BASE_STYLES: [(&str, &str); 3] = [
    (SATELLITE, "mapbox.satellite"),
    (GRAYSCALE, "mapbox.light"),
    (OUTDOORS, "mapbox.outdoors"),
];

/// A raster tile layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub id: String,
    pub access_token: String,
}

/// A base layer with its switcher label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTileLayer {
    pub name: String,
    pub layer: TileLayer,
}

/// The toggleable overlays.
#[derive(Debug, Clone)]
pub struct Overlays {
    pub earthquakes: PointLayer,
    pub tectonic_plates: LayerGroup,
}

/// Active layers and viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
    pub base_layer: String,
    /// Visible overlays, in switcher order
    pub overlays: Vec<String>,
}

/// The layer switcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerControl {
    pub collapsed: bool,
    pub base_layers: Vec<String>,
    pub overlays: Vec<String>,
}

/// A fully composed map.
#[derive(Debug, Clone)]
pub struct Map {
    base_layers: Vec<NamedTileLayer>,
    overlays: Overlays,
    view: MapView,
    layer_control: LayerControl,
    legend: Legend,
}

impl Map {
    /// Compose the map and start loading the plate boundaries.
    ///
    /// `plates` is spawned onto the current tokio runtime; the returned
    /// handle resolves when the overlay is filled or the fetch fails.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn compose<F>(
        config: &MapConfig,
        earthquakes: PointLayer,
        plates: F,
    ) -> (Self, JoinHandle<Result<(), QuakemapError>>)
    where
        F: Future<Output = Result<PlateBoundaries, QuakemapError>> + Send + 'static,
    {
        let base_layers: Vec<NamedTileLayer> = BASE_STYLES
            .iter()
            .map(|(name, id)| NamedTileLayer {
                name: (*name).to_string(),
                layer: TileLayer {
                    url_template: config.tile_url_template.clone(),
                    attribution: config.attribution.clone(),
                    max_zoom: config.max_zoom,
                    id: (*id).to_string(),
                    access_token: config.access_token.clone(),
                },
            })
            .collect();

        let (tectonic_plates, writer) = plates::layer_group();

        let base_names: Vec<String> = base_layers.iter().map(|b| b.name.clone()).collect();
        let overlay_names = vec![EARTHQUAKES.to_string(), TECTONIC_PLATES.to_string()];

        let view = MapView {
            center: config.center,
            zoom: config.zoom,
            base_layer: SATELLITE.to_string(),
            overlays: overlay_names.clone(),
        };

        let plates_task = tokio::spawn(plates::load_plate_boundaries(plates, writer));

        let layer_control = LayerControl {
            collapsed: false,
            base_layers: base_names,
            overlays: overlay_names,
        };

        tracing::info!(
            "composed map with {} earthquakes over {} base layers",
            earthquakes.len(),
            base_layers.len()
        );

        let map = Self {
            base_layers,
            overlays: Overlays {
                earthquakes,
                tectonic_plates,
            },
            view,
            layer_control,
            legend: Legend::magnitude_scale(),
        };
        (map, plates_task)
    }

    #[must_use]
    pub fn base_layers(&self) -> &[NamedTileLayer] {
        &self.base_layers
    }

    #[must_use]
    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    #[must_use]
    pub fn view(&self) -> &MapView {
        &self.view
    }

    #[must_use]
    pub fn layer_control(&self) -> &LayerControl {
        &self.layer_control
    }

    #[must_use]
    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    /// Apply a layer selection through the layer control.
    ///
    /// # Errors
    ///
    /// Returns `UnknownLayer` for any name the map does not have.
    pub fn apply_view(&mut self, options: &ViewOptions) -> Result<(), QuakemapError> {
        // Check every name first so a rejected selection changes nothing.
        let unknown = options
            .base_layer
            .iter()
            .find(|b| !self.layer_control.base_layers.contains(*b))
            .or_else(|| {
                options
                    .hidden_overlays
                    .iter()
                    .find(|o| !self.layer_control.overlays.contains(*o))
            });
        if let Some(name) = unknown {
            return Err(QuakemapError::UnknownLayer(name.clone()));
        }

        if let Some(base) = &options.base_layer {
            self.select_base_layer(base)?;
        }
        for overlay in &options.hidden_overlays {
            self.set_overlay_visible(overlay, false)?;
        }
        Ok(())
    }

    /// Switch the active base layer.
    ///
    /// # Errors
    ///
    /// Returns `UnknownLayer` if no base layer has that name.
    pub fn select_base_layer(&mut self, name: &str) -> Result<(), QuakemapError> {
        if !self.layer_control.base_layers.iter().any(|b| b == name) {
            return Err(QuakemapError::UnknownLayer(name.to_string()));
        }
        self.view.base_layer = name.to_string();
        Ok(())
    }

    /// Show or hide an overlay.
    ///
    /// # Errors
    ///
    /// Returns `UnknownLayer` if no overlay has that name.
    pub fn set_overlay_visible(&mut self, name: &str, visible: bool) -> Result<(), QuakemapError> {
        if !self.layer_control.overlays.iter().any(|o| o == name) {
            return Err(QuakemapError::UnknownLayer(name.to_string()));
        }
        // Rebuild from the control so the visible set keeps switcher order.
        let active: Vec<String> = self
            .layer_control
            .overlays
            .iter()
            .filter(|o| {
                if o.as_str() == name {
                    visible
                } else {
                    self.view.overlays.contains(o)
                }
            })
            .cloned()
            .collect();
        self.view.overlays = active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::earthquake_layer;
    use crate::models::{EarthquakeFeed, PlateBoundaries};

    fn sample_layer() -> PointLayer {
        let feed: EarthquakeFeed =
            serde_json::from_str(include_str!("../tools/sample_all_week.json")).unwrap();
        earthquake_layer(&feed.features).unwrap()
    }

    fn sample_plates() -> PlateBoundaries {
        serde_json::from_str(include_str!("../tools/sample_plates.json")).unwrap()
    }

    fn config() -> MapConfig {
        MapConfig {
            access_token: "pk.test".into(),
            ..MapConfig::default()
        }
    }

    #[tokio::test]
    async fn test_compose_initial_state() {
        let plates = sample_plates();
        let (map, task) = Map::compose(&config(), sample_layer(), async move { Ok(plates) });

        let names: Vec<&str> = map.base_layers().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, [SATELLITE, GRAYSCALE, OUTDOORS]);

        let ids: Vec<&str> = map.base_layers().iter().map(|b| b.layer.id.as_str()).collect();
        assert_eq!(ids, ["mapbox.satellite", "mapbox.light", "mapbox.outdoors"]);
        assert!(map.base_layers().iter().all(|b| b.layer.access_token == "pk.test"));
        assert!(map.base_layers().iter().all(|b| b.layer.max_zoom == 18));

        assert_eq!(map.view().center, LatLng::new(40.5, -115.0));
        assert!((map.view().zoom - 2.5).abs() < f64::EPSILON);
        assert_eq!(map.view().base_layer, SATELLITE);
        assert_eq!(map.view().overlays, [EARTHQUAKES, TECTONIC_PLATES]);

        assert!(!map.layer_control().collapsed);
        assert_eq!(map.layer_control().overlays, [EARTHQUAKES, TECTONIC_PLATES]);
        assert_eq!(map.legend().entries.len(), 6);

        task.await.unwrap().unwrap();
        let layer = map.overlays().tectonic_plates.snapshot().unwrap();
        assert_eq!(layer.boundaries.features.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_plate_fetch_leaves_rest_of_map_intact() {
        let (map, task) = Map::compose(&config(), sample_layer(), async {
            Err(QuakemapError::Api {
                status: 503,
                message: "unavailable".into(),
            })
        });

        let result = task.await.unwrap();
        assert!(matches!(result, Err(QuakemapError::Api { status: 503, .. })));

        assert!(map.overlays().tectonic_plates.is_empty());
        assert_eq!(map.overlays().earthquakes.len(), 3);
        assert_eq!(map.base_layers().len(), 3);
        assert_eq!(map.view().overlays, [EARTHQUAKES, TECTONIC_PLATES]);
    }

    #[tokio::test]
    async fn test_layer_control_operations() {
        let (mut map, _task) =
            Map::compose(&config(), PointLayer::default(), async { Ok(PlateBoundaries::empty()) });

        map.select_base_layer(OUTDOORS).unwrap();
        assert_eq!(map.view().base_layer, OUTDOORS);
        assert!(matches!(
            map.select_base_layer("Terrain"),
            Err(QuakemapError::UnknownLayer(_))
        ));

        map.set_overlay_visible(EARTHQUAKES, false).unwrap();
        assert_eq!(map.view().overlays, [TECTONIC_PLATES]);
        map.set_overlay_visible(EARTHQUAKES, true).unwrap();
        assert_eq!(map.view().overlays, [EARTHQUAKES, TECTONIC_PLATES]);
        assert!(map.set_overlay_visible("Faults", true).is_err());
    }

    #[tokio::test]
    async fn test_apply_view_options() {
        let (mut map, _task) =
            Map::compose(&config(), PointLayer::default(), async { Ok(PlateBoundaries::empty()) });

        let options = ViewOptions {
            base_layer: Some(GRAYSCALE.into()),
            hidden_overlays: vec![TECTONIC_PLATES.into()],
        };
        map.apply_view(&options).unwrap();
        assert_eq!(map.view().base_layer, GRAYSCALE);
        assert_eq!(map.view().overlays, [EARTHQUAKES]);

        let bad = ViewOptions {
            base_layer: Some("Night".into()),
            hidden_overlays: Vec::new(),
        };
        assert!(matches!(map.apply_view(&bad), Err(QuakemapError::UnknownLayer(_))));

        let (mut fresh, _task) =
            Map::compose(&config(), PointLayer::default(), async { Ok(PlateBoundaries::empty()) });
        let partly_bad = ViewOptions {
            base_layer: Some(GRAYSCALE.into()),
            hidden_overlays: vec![EARTHQUAKES.into(), "Bogus".into()],
        };
        let err = fresh.apply_view(&partly_bad).unwrap_err();
        assert!(matches!(err, QuakemapError::UnknownLayer(name) if name == "Bogus"));
        assert_eq!(fresh.view().base_layer, SATELLITE);
        assert_eq!(fresh.view().overlays, [EARTHQUAKES, TECTONIC_PLATES]);
    }
}
