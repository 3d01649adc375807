// src/report.rs
//! Track summaries and their terminal rendering

use crate::{
    error::Result,
    tiles::{CacheStats, PrefetchReport},
    track::{geo::knots_from_mps, Bounds, Snapshot, TimeRange, Track},
};
use chrono::{DateTime, Utc};
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub name: Option<String>,
    pub color: Option<String>,
    pub points: usize,
    pub segments: usize,
    pub bounds: Option<Bounds>,
    pub time_range: Option<TimeRange>,
}

impl TrackSummary {
    pub fn from_track(track: &Track) -> Self {
        Self {
            name: track.meta().name.clone(),
            color: track.meta().color.clone(),
            points: track.len(),
            segments: track.segment_starts().len(),
            bounds: track.bounds(),
            time_range: track.time_range(),
        }
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed track")
    }
}

/// A track's state at one moment, ready for printing
#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub name: Option<String>,
    pub at: DateTime<Utc>,
    pub back: usize,
    pub snapshot: Snapshot,
    pub speed_knots: f64,
}

impl PositionReport {
    pub fn new(track: &Track, at: DateTime<Utc>, back: usize) -> Result<Self> {
        let snapshot = track.snapshot_at(at, back)?;
        Ok(Self {
            name: track.meta().name.clone(),
            at,
            back,
            speed_knots: knots_from_mps(snapshot.info.speed),
            snapshot,
        })
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn header(out: &mut impl Write, title: &str, color: Color) -> Result<()> {
    queue!(
        out,
        SetForegroundColor(color),
        Print(format!("{}\n", title)),
        ResetColor
    )?;
    Ok(())
}

pub fn render_summaries(out: &mut impl Write, summaries: &[TrackSummary]) -> Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Green),
        Print("=".repeat(60)),
        Print("\n"),
        Print(format!("Regatta Tracker - {} track(s)\n", summaries.len())),
        Print("=".repeat(60)),
        Print("\n"),
        ResetColor
    )?;

    for summary in summaries {
        header(out, &format!("TRACK: {}", summary.display_name()), Color::Yellow)?;
        queue!(
            out,
            Print(format!("  Color:     {}\n", summary.color.as_deref().unwrap_or("-"))),
            Print(format!("  Points:    {:>12}\n", summary.points)),
            Print(format!("  Segments:  {:>12}\n", summary.segments))
        )?;

        match summary.bounds {
            Some(b) => queue!(
                out,
                Print(format!("  Longitude: {:>12.6}° .. {:.6}°\n", b.min_lon, b.max_lon)),
                Print(format!("  Latitude:  {:>12.6}° .. {:.6}°\n", b.min_lat, b.max_lat))
            )?,
            None => queue!(out, Print("  Extent:    no points\n"))?,
        }

        if let Some(range) = summary.time_range {
            let minutes = range.duration().num_minutes();
            queue!(
                out,
                Print(format!("  Start:     {}\n", format_time(range.start))),
                Print(format!("  End:       {}\n", format_time(range.end))),
                Print(format!("  Duration:  {}h {}m\n", minutes / 60, minutes % 60))
            )?;
        }
        queue!(out, Print("\n"))?;
    }

    out.flush()?;
    Ok(())
}

pub fn render_position(out: &mut impl Write, report: &PositionReport) -> Result<()> {
    header(
        out,
        &format!("POSITION: {}", report.name.as_deref().unwrap_or("Unnamed track")),
        Color::Cyan,
    )?;

    let position = &report.snapshot.position;
    queue!(
        out,
        Print(format!("  As of:     {}\n", format_time(report.at))),
        Print(format!("  Fix time:  {}\n", format_time(position.time))),
        Print(format!("  Latitude:  {:>12.6}°\n", position.latitude)),
        Print(format!("  Longitude: {:>12.6}°\n", position.longitude))
    )?;
    if report.back > 0 {
        queue!(out, Print(format!("  Back:      {:>12} fixes\n", report.back)))?;
    }
    queue!(
        out,
        Print(format!("  Bearing:   {:>12.1}°\n", report.snapshot.info.bearing)),
        Print(format!("  Speed:     {:>12.2} kn\n", report.speed_knots)),
        Print(format!("  Shown:     {:>12} points\n\n", report.snapshot.points_shown))
    )?;

    out.flush()?;
    Ok(())
}

pub fn render_prefetch(
    out: &mut impl Write,
    source: &str,
    zoom: u8,
    report: &PrefetchReport,
    stats: &CacheStats,
) -> Result<()> {
    header(out, &format!("TILES: {} @ zoom {}", source, zoom), Color::Magenta)?;
    queue!(
        out,
        Print(format!("  Fetched:   {:>12}\n", report.fetched)),
        Print(format!("  Cached:    {:>12}\n", report.cached)),
        Print(format!(
            "  On disk:   {:>12} tiles ({:.2} MB)\n\n",
            stats.disk_tiles,
            stats.disk_size_mb()
        ))
    )?;
    out.flush()?;
    Ok(())
}
