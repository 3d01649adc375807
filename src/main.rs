// src/main.rs
//! Regatta Tracker - GPX race track analysis and tile cache warm-up

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use regatta_tracker::{
    config::TrackerConfig,
    report::{self, PositionReport, TrackSummary},
    tiles::{self, CachedTiler},
    track::{gpx_input, Bounds, Track},
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "regatta-tracker", version, about = "Sailing race tracks on cached map tiles")]
struct Cli {
    /// Configuration file (defaults to ~/.config/regatta-tracker/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the tile cache
    #[arg(long, global = true)]
    cache_root: Option<PathBuf>,

    /// Tile source name (stamenterrain, openstreetmap)
    #[arg(long, global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print extents and time ranges of every track in a GPX file
    Summary {
        gpx: PathBuf,
        /// Emit JSON instead of the terminal report
        #[arg(long)]
        json: bool,
    },
    /// Show where each track was at a given moment
    Position {
        gpx: PathBuf,
        /// RFC 3339 time; defaults to the middle of the first track
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Step this many fixes further back
        #[arg(long, default_value_t = 0)]
        back: usize,
        #[arg(long)]
        json: bool,
    },
    /// Download every tile covering the tracks into the cache
    Tiles {
        gpx: PathBuf,
        #[arg(long)]
        zoom: Option<u8>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load_from(path)?,
        None => TrackerConfig::load().unwrap_or_default(),
    };
    if let Some(root) = cli.cache_root {
        config.cache_root = Some(root);
    }
    if let Some(source) = cli.source {
        config.tile_source = source;
    }

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Summary { gpx, json } => {
            let tracks = load(&gpx, &config)?;
            let summaries: Vec<TrackSummary> =
                tracks.iter().map(TrackSummary::from_track).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                report::render_summaries(&mut stdout, &summaries)?;
            }
        }
        Command::Position { gpx, at, back, json } => {
            let tracks = load(&gpx, &config)?;
            let at = match at {
                Some(at) => at,
                None => tracks
                    .iter()
                    .find_map(|t| t.time_range())
                    .map(|range| range.midpoint())
                    .context("no timestamped points in file")?,
            };

            let mut reports = Vec::new();
            for track in &tracks {
                match PositionReport::new(track, at, back) {
                    Ok(position) => reports.push(position),
                    Err(e) => tracing::warn!(
                        "{}: {}",
                        track.meta().name.as_deref().unwrap_or("unnamed track"),
                        e
                    ),
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for position in &reports {
                    report::render_position(&mut stdout, position)?;
                }
            }
        }
        Command::Tiles { gpx, zoom } => {
            let tracks = load(&gpx, &config)?;
            let zoom = tiles::check_zoom(zoom.unwrap_or(config.zoom))?;
            let extents = tracks.iter().filter_map(Track::bounds);
            let Some(bounds) = extents.reduce(|a, b| a.union(&b)) else {
                bail!("{} contains no track points", gpx.display());
            };

            let cache = CachedTiler::with_http(
                tiles::source_by_name(&config.tile_source)?,
                config.cache_root()?,
                &config.user_agent,
                config.timeout(),
            )?;
            let wanted = tiles::tiles_covering(&bounds, zoom)?;
            tracing::info!("{} tiles cover {}", wanted.len(), describe(&bounds));

            let prefetch = cache
                .prefetch(wanted)
                .with_context(|| format!("caching tiles into {}", cache.cache_dir().display()))?;
            let stats = cache.stats()?;
            report::render_prefetch(&mut stdout, &config.tile_source, zoom, &prefetch, &stats)?;
        }
    }

    Ok(())
}

fn load(gpx: &Path, config: &TrackerConfig) -> anyhow::Result<Vec<Track>> {
    gpx_input::load_tracks(gpx, config)
        .with_context(|| format!("loading tracks from {}", gpx.display()))
}

fn describe(bounds: &Bounds) -> String {
    format!(
        "lon {:.4}..{:.4}, lat {:.4}..{:.4}",
        bounds.min_lon, bounds.max_lon, bounds.min_lat, bounds.max_lat
    )
}
