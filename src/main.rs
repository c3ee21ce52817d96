//! quakemap - Earthquakes and tectonic plate boundaries on an interactive map.
//!
//! Fetches the USGS earthquake feed and a plate boundary feed, styles each
//! event by magnitude and composes the result into a Leaflet map.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod config;
mod errors;
mod layers;
mod legend;
mod map;
mod models;
mod plates;
mod render;
mod server;
mod style;

use cli::{Cli, Command};
use client::FeedClient;
use config::MapConfig;
use map::Map;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Render(args) => cmd_render(args),
        Command::Serve(args) => cmd_serve(args),
        Command::Legend(args) => cmd_legend(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `render` command - fetch both feeds and write the map once.
fn cmd_render(args: cli::RenderArgs) -> Result<()> {
    let config = args.map.to_config();
    let plates_wait = Duration::from_secs(args.plates_wait_secs);

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    let map = runtime.block_on(compose_map(&config, plates_wait))?;

    // A page written before the boundaries arrived fetches them itself.
    let plates_source = Some(config.plates_url.as_str());
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render::write_map(&mut writer, &map, args.format, plates_source)?;
            writer.flush()?;
            tracing::info!("wrote map to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render::write_map(&mut handle, &map, args.format, plates_source)?;
        }
    }

    Ok(())
}

/// Fetch the earthquakes and compose the map, giving the plate boundaries
/// at most `plates_wait` to land in the overlay.
async fn compose_map(config: &MapConfig, plates_wait: Duration) -> Result<Map> {
    let client = FeedClient::new(config.timeout).context("failed to create feed client")?;

    let feed = client
        .fetch_earthquakes(&config.earthquake_feed_url)
        .await
        .context("failed to fetch earthquake feed")?;

    let earthquakes =
        layers::earthquake_layer(&feed.features).context("failed to build earthquake layer")?;
    if earthquakes.is_empty() {
        tracing::warn!("earthquake feed contained no events");
    }

    let plates = {
        let client = client.clone();
        let url = config.plates_url.clone();
        async move { client.fetch_plate_boundaries(&url).await }
    };
    let (mut map, plates_task) = Map::compose(config, earthquakes, plates);
    map.apply_view(&config.view).context("invalid layer selection")?;

    // The overlay stays empty if the boundaries cannot be loaded in time.
    match tokio::time::timeout(plates_wait, plates_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!("plate boundaries unavailable: {}", e),
        Ok(Err(e)) => tracing::warn!("plate boundary task failed: {}", e),
        Err(_) => tracing::warn!(
            "plate boundaries not loaded after {}s; writing the map without them",
            plates_wait.as_secs_f64()
        ),
    }

    Ok(map)
}

/// Execute the `serve` command - start the web server.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        map: args.map.to_config(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 quakemap\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Feed:    {}", config.map.earthquake_feed_url);
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}

/// Execute the `legend` command.
fn cmd_legend(args: &cli::LegendArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    render::write_legend(&mut handle, &legend::Legend::magnitude_scale(), args.format)?;
    Ok(())
}
