//! Tectonic plate boundary overlay.
//!
//! The overlay group exists (and is shown) before any boundary data
//! arrives. A single background load fills it once, whenever the feed
//! resolves; if the load fails the group stays empty.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::errors::QuakemapError;
use crate::models::PlateBoundaries;

/// Leaflet path options for boundary lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: f64,
}

/// Style applied to every plate boundary.
pub const PLATE_STYLE: LineStyle = LineStyle {
    color: "orange",
    weight: 2.0,
};

/// A styled collection of boundary lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineLayer {
    pub style: LineStyle,
    pub boundaries: PlateBoundaries,
}

/// Read handle on an overlay group.
///
/// Cloning yields another view of the same group.
#[derive(Debug, Clone)]
pub struct LayerGroup {
    rx: watch::Receiver<Option<Arc<LineLayer>>>,
}

/// The only handle that can add a layer to its group.
#[derive(Debug)]
pub struct LayerGroupWriter {
    tx: watch::Sender<Option<Arc<LineLayer>>>,
}

/// Create an empty overlay group and its writer.
#[must_use]
pub fn layer_group() -> (LayerGroup, LayerGroupWriter) {
    let (tx, rx) = watch::channel(None);
    (LayerGroup { rx }, LayerGroupWriter { tx })
}

impl LayerGroup {
    /// Current contents, if the layer has arrived.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<LineLayer>> {
        self.rx.borrow().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_none()
    }

    /// Wait until the layer arrives.
    ///
    /// Returns `None` if the writer went away without adding anything.
    /// Waits indefinitely while the writer is still alive.
    pub async fn loaded(&self) -> Option<Arc<LineLayer>> {
        let mut rx = self.rx.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(current) => (*current).clone(),
            Err(_) => None,
        }
    }
}

impl LayerGroupWriter {
    /// Add the layer to the group. Consumes the writer.
    pub fn add(self, layer: LineLayer) {
        self.tx.send_replace(Some(Arc::new(layer)));
    }
}

/// Await the boundary fetch and add the styled result to the group.
///
/// # Errors
///
/// Returns the fetch error unchanged. The group is left empty.
pub async fn load_plate_boundaries<F>(fetch: F, writer: LayerGroupWriter) -> Result<(), QuakemapError>
where
    F: Future<Output = Result<PlateBoundaries, QuakemapError>>,
{
    let boundaries = fetch.await?;
    let vertices: usize = boundaries
        .features
        .iter()
        .map(|f| f.geometry.vertex_count())
        .sum();
    tracing::info!(
        "loaded {} plate boundaries ({} vertices)",
        boundaries.features.len(),
        vertices
    );

    writer.add(LineLayer {
        style: PLATE_STYLE,
        boundaries,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plates() -> PlateBoundaries {
        serde_json::from_str(include_str!("../tools/sample_plates.json")).unwrap()
    }

    #[test]
    fn test_group_starts_empty() {
        let (group, _writer) = layer_group();
        assert!(group.is_empty());
        assert!(group.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_load_fills_group_with_orange_lines() {
        let (group, writer) = layer_group();
        let plates = sample_plates();
        let expected = plates.clone();

        load_plate_boundaries(async move { Ok(plates) }, writer)
            .await
            .unwrap();

        let layer = group.snapshot().expect("group should be filled");
        assert_eq!(layer.style.color, "orange");
        assert!((layer.style.weight - 2.0).abs() < f64::EPSILON);
        assert_eq!(layer.boundaries, expected);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_group_empty() {
        let (group, writer) = layer_group();

        let result = load_plate_boundaries(
            async { Err(QuakemapError::InvalidResponse("network down".into())) },
            writer,
        )
        .await;

        assert!(result.is_err());
        assert!(group.is_empty());
        assert!(group.loaded().await.is_none());
    }

    #[tokio::test]
    async fn test_loaded_waits_for_late_writer() {
        let (group, writer) = layer_group();
        let waiter = tokio::spawn({
            let group = group.clone();
            async move { group.loaded().await }
        });

        tokio::task::yield_now().await;
        writer.add(LineLayer {
            style: PLATE_STYLE,
            boundaries: PlateBoundaries::empty(),
        });

        let layer = waiter.await.unwrap();
        assert!(layer.is_some());
    }
}
