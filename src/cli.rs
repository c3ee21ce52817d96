//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::client::FeedType;
use crate::config::{self, MapConfig, ViewOptions};
use crate::render::Format;

/// Map recent earthquakes and tectonic plate boundaries.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch both feeds and write the map (one-shot)
    Render(RenderArgs),

    /// Serve the map over HTTP
    Serve(ServeArgs),

    /// Print the magnitude legend
    Legend(LegendArgs),
}

/// Feed, tile and credential options shared by `render` and `serve`.
#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Tile provider access token
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    pub access_token: String,

    /// USGS summary feed to map
    #[arg(long, default_value = "all_week", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Earthquake feed URL (overrides --feed)
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Plate boundary GeoJSON URL
    #[arg(long, default_value = config::PLATES_URL)]
    pub plates_url: String,

    /// Tile URL template ({id}, {z}, {x}, {y}, {accessToken})
    #[arg(long, default_value = config::TILE_URL_TEMPLATE)]
    pub tile_url: String,

    /// Per-request timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Initial base layer (Satellite, Grayscale, Outdoors)
    #[arg(long)]
    pub base_layer: Option<String>,

    /// Overlay to start hidden (Earthquakes, TectonicPlates); repeatable
    #[arg(long = "hide")]
    pub hidden_overlays: Vec<String>,
}

impl MapArgs {
    /// Freeze the options into a map configuration.
    #[must_use]
    pub fn to_config(&self) -> MapConfig {
        MapConfig {
            access_token: self.access_token.clone(),
            earthquake_feed_url: self.feed_url.clone().unwrap_or_else(|| self.feed.url()),
            plates_url: self.plates_url.clone(),
            tile_url_template: self.tile_url.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            view: ViewOptions {
                base_layer: self.base_layer.clone(),
                hidden_overlays: self.hidden_overlays.clone(),
            },
            ..MapConfig::default()
        }
    }
}

/// Arguments for the `render` command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub map: MapArgs,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "html", value_parser = parse_format)]
    pub format: Format,

    /// Seconds to wait for the plate boundaries before writing without them
    #[arg(long, default_value = "10")]
    pub plates_wait_secs: u64,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub map: MapArgs,

    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `legend` command.
#[derive(Parser, Debug)]
pub struct LegendArgs {
    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse a feed type from string.
fn parse_feed_type(s: &str) -> Result<FeedType, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let cli = Cli::try_parse_from(["quakemap", "render"]).unwrap();
        let Command::Render(args) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(args.format, Format::Html);
        assert_eq!(args.plates_wait_secs, 10);

        let config = args.map.to_config();
        assert!(config.earthquake_feed_url.ends_with("/all_week.geojson"));
        assert_eq!(config.plates_url, config::PLATES_URL);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_feed_url_overrides_feed() {
        let cli = Cli::try_parse_from([
            "quakemap",
            "render",
            "--feed",
            "4.5_day",
            "--feed-url",
            "http://localhost/quakes.json",
            "--access-token",
            "pk.abc",
            "--timeout-secs",
            "5",
            "--base-layer",
            "Outdoors",
            "--hide",
            "TectonicPlates",
        ])
        .unwrap();
        let Command::Render(args) = cli.command else {
            panic!("expected render command");
        };

        let config = args.map.to_config();
        assert_eq!(config.earthquake_feed_url, "http://localhost/quakes.json");
        assert_eq!(config.access_token, "pk.abc");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.view.base_layer.as_deref(), Some("Outdoors"));
        assert_eq!(config.view.hidden_overlays, ["TectonicPlates"]);
    }

    #[test]
    fn test_rejects_unknown_feed() {
        assert!(Cli::try_parse_from(["quakemap", "serve", "--feed", "all_year"]).is_err());
    }
}
