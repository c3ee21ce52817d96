//! Web server for the live map.
//!
//! The earthquake feed is fetched before the server starts listening.
//! The plate boundaries load in the background; pages served before
//! they arrive fetch them from `/layers/plates`, which answers once the
//! load resolves.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::client::FeedClient;
use crate::config::MapConfig;
use crate::layers;
use crate::map::Map;
use crate::models::PlateBoundaries;
use crate::render::{self, MapDocument};

/// Route the page uses to fetch boundaries that were not embedded.
pub const PLATES_ROUTE: &str = "/layers/plates";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub map: MapConfig,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    map: Arc<Map>,
}

impl AppState {
    #[must_use]
    pub fn new(map: Map) -> Self {
        Self { map: Arc::new(map) }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/map.json", get(document_handler))
        .route(PLATES_ROUTE, get(plates_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Fetch the earthquakes, compose the map and serve it.
///
/// # Errors
///
/// Returns an error if the earthquake feed cannot be loaded or the
/// listener cannot bind.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = FeedClient::new(config.map.timeout)?;

    let feed = client.fetch_earthquakes(&config.map.earthquake_feed_url).await?;
    let earthquakes = layers::earthquake_layer(&feed.features)?;

    let plates = {
        let client = client.clone();
        let url = config.map.plates_url.clone();
        async move { client.fetch_plate_boundaries(&url).await }
    };
    let (mut map, plates_task) = Map::compose(&config.map, earthquakes, plates);
    map.apply_view(&config.map.view)?;

    tokio::spawn(async move {
        match plates_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("plate boundaries unavailable: {}", e),
            Err(e) => tracing::warn!("plate boundary task failed: {}", e),
        }
    });

    let app = create_router(AppState::new(map));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌍 quakemap serving at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler.
async fn index_handler(State(state): State<AppState>) -> Response {
    let doc = MapDocument::new(&state.map, Some(PLATES_ROUTE));
    match render::render_page(&doc) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!("failed to render page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Map document handler.
async fn document_handler(State(state): State<AppState>) -> Response {
    Json(MapDocument::new(&state.map, Some(PLATES_ROUTE))).into_response()
}

/// Plate boundaries, once loaded.
///
/// Waits for the background load. A failed load answers with an empty
/// collection so the overlay simply stays empty.
async fn plates_handler(State(state): State<AppState>) -> Json<PlateBoundaries> {
    match state.map.overlays().tectonic_plates.loaded().await {
        Some(layer) => Json(layer.boundaries.clone()),
        None => Json(PlateBoundaries::empty()),
    }
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QuakemapError;
    use crate::layers::PointLayer;

    type PlatesTask = tokio::task::JoinHandle<Result<(), QuakemapError>>;

    fn state_with(plates: Result<PlateBoundaries, QuakemapError>) -> (AppState, PlatesTask) {
        let (map, task) =
            Map::compose(&MapConfig::default(), PointLayer::default(), async move { plates });
        (AppState::new(map), task)
    }

    #[tokio::test]
    async fn test_plates_handler_returns_loaded_boundaries() {
        let plates: PlateBoundaries =
            serde_json::from_str(include_str!("../tools/sample_plates.json")).unwrap();
        let (state, _task) = state_with(Ok(plates));

        let Json(body) = plates_handler(State(state)).await;
        assert_eq!(body.features.len(), 2);
    }

    #[tokio::test]
    async fn test_plates_handler_empty_after_failure() {
        let (state, task) = state_with(Err(QuakemapError::InvalidResponse("offline".into())));
        assert!(task.await.unwrap().is_err());

        let Json(body) = plates_handler(State(state)).await;
        assert!(body.features.is_empty());
    }

    #[tokio::test]
    async fn test_index_renders_page() {
        let (state, _task) = state_with(Ok(PlateBoundaries::empty()));
        let response = index_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health_handler().await, "OK");
    }
}
