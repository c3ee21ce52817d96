//! HTTP client for the earthquake and plate boundary feeds.
//!
//! Async reqwest with rustls for TLS. Each call issues exactly one GET:
//! no retries, and no timeout unless one is configured.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::errors::QuakemapError;
use crate::models::{EarthquakeFeed, PlateBoundaries};

/// User agent string for feed requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Minimum magnitude of a USGS summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    All,
    M1,
    M25,
    M45,
    Significant,
}

/// Time window of a USGS summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
}

/// A USGS summary feed, named like `all_week` or `4.5_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedType {
    pub threshold: Threshold,
    pub period: Period,
}

impl Default for FeedType {
    fn default() -> Self {
        Self {
            threshold: Threshold::All,
            period: Period::Week,
        }
    }
}

impl FeedType {
    /// Get the feed name as used in the URL path.
    #[must_use]
    pub fn name(self) -> String {
        let threshold = match self.threshold {
            Threshold::All => "all",
            Threshold::M1 => "1.0",
            Threshold::M25 => "2.5",
            Threshold::M45 => "4.5",
            Threshold::Significant => "significant",
        };
        let period = match self.period {
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        };
        format!("{threshold}_{period}")
    }

    /// Full URL of this summary feed.
    #[must_use]
    pub fn url(self) -> String {
        format!(
            "{USGS_BASE_URL}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.name()
        )
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (threshold, period) = lower
            .rsplit_once('_')
            .ok_or_else(|| format!("unknown feed type: {s} (expected e.g. all_week)"))?;

        let threshold = match threshold {
            "all" => Threshold::All,
            "1.0" => Threshold::M1,
            "2.5" => Threshold::M25,
            "4.5" => Threshold::M45,
            "significant" => Threshold::Significant,
            _ => return Err(format!("unknown feed threshold: {threshold}")),
        };
        let period = match period {
            "hour" => Period::Hour,
            "day" => Period::Day,
            "week" => Period::Week,
            "month" => Period::Month,
            _ => return Err(format!("unknown feed period: {period}")),
        };

        Ok(Self { threshold, period })
    }
}

/// Client for both map feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Create a new feed client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self, QuakemapError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch the earthquake feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn fetch_earthquakes(&self, url: &str) -> Result<EarthquakeFeed, QuakemapError> {
        let feed: EarthquakeFeed = self.get_json(url).await?;
        feed.validate()?;

        if let Some(meta) = &feed.metadata {
            debug!(
                "feed '{}' generated at {} reports {} events",
                meta.title, meta.generated, meta.count
            );
        }
        debug!("fetched {} events", feed.features.len());
        Ok(feed)
    }

    /// Fetch the plate boundary feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn fetch_plate_boundaries(
        &self,
        url: &str,
    ) -> Result<PlateBoundaries, QuakemapError> {
        let plates: PlateBoundaries = self.get_json(url).await?;
        plates.validate()?;

        debug!("fetched {} boundary features", plates.features.len());
        Ok(plates)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, QuakemapError> {
        debug!("fetching {}", url);

        let response = self.client.get(url).send().await?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuakemapError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{addr}")
    }

    #[test]
    fn test_feed_type_round_trip() {
        for name in ["all_week", "2.5_day", "significant_month", "4.5_hour"] {
            let parsed: FeedType = name.parse().expect("failed to parse");
            assert_eq!(parsed.name(), name);
        }
    }

    #[test]
    fn test_feed_type_rejects_unknown() {
        assert!("all".parse::<FeedType>().is_err());
        assert!("3.0_week".parse::<FeedType>().is_err());
        assert!("all_year".parse::<FeedType>().is_err());
    }

    #[test]
    fn test_default_feed_url() {
        assert_eq!(
            FeedType::default().url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson"
        );
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_http_error() {
        let client = FeedClient::new(Some(Duration::from_secs(2))).unwrap();
        let result = client.fetch_plate_boundaries("http://127.0.0.1:9/plates.json").await;
        assert!(matches!(result, Err(QuakemapError::Http(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let base = serve(Router::new().route(
            "/quakes.json",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;

        let client = FeedClient::new(None).unwrap();
        let result = client.fetch_earthquakes(&format!("{base}/quakes.json")).await;
        match result {
            Err(QuakemapError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_collection_type_is_rejected() {
        let base = serve(Router::new().route(
            "/quakes.json",
            get(|| async { r#"{"type":"Feature","features":[]}"# }),
        ))
        .await;

        let client = FeedClient::new(None).unwrap();
        let result = client.fetch_earthquakes(&format!("{base}/quakes.json")).await;
        assert!(matches!(result, Err(QuakemapError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_fetches_sample_feed() {
        let base = serve(Router::new().route(
            "/quakes.json",
            get(|| async { include_str!("../tools/sample_all_week.json") }),
        ))
        .await;

        let client = FeedClient::new(None).unwrap();
        let feed = client.fetch_earthquakes(&format!("{base}/quakes.json")).await.unwrap();
        assert_eq!(feed.features.len(), 3);
    }
}
