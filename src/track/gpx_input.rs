// src/track/gpx_input.rs
//! Reading GPX logs into raw tracks

use super::model::{RawPoint, RawSegment, RawTrack, Track, TrackMeta};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Parse every `<trk>` of a GPX document, keeping segment boundaries.
///
/// Points without a `<time>` cannot be placed on the race timeline and are skipped.
pub fn raw_tracks_from_reader<R: Read>(reader: R) -> Result<Vec<RawTrack>> {
    let gpx = gpx::read(reader).map_err(|e| TrackerError::Gpx(e.to_string()))?;

    let mut tracks = Vec::with_capacity(gpx.tracks.len());
    for track in &gpx.tracks {
        let mut skipped = 0usize;
        let mut segments = Vec::with_capacity(track.segments.len());

        for segment in &track.segments {
            let mut points = Vec::with_capacity(segment.points.len());
            for waypoint in &segment.points {
                let time = match &waypoint.time {
                    Some(time) => {
                        let formatted =
                            time.format().map_err(|e| TrackerError::Gpx(e.to_string()))?;
                        DateTime::parse_from_rfc3339(&formatted)
                            .map_err(|e| {
                                TrackerError::Gpx(format!("Bad point time {}: {}", formatted, e))
                            })?
                            .with_timezone(&Utc)
                    }
                    None => {
                        skipped += 1;
                        continue;
                    }
                };
                let position = waypoint.point();
                points.push(RawPoint {
                    longitude: position.x(),
                    latitude: position.y(),
                    elevation: waypoint.elevation,
                    time,
                });
            }
            segments.push(RawSegment { points });
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} points without a timestamp in track {}",
                skipped,
                track.name.as_deref().unwrap_or("<unnamed>")
            );
        }

        tracks.push(RawTrack {
            name: track.name.clone(),
            segments,
        });
    }

    tracing::debug!("Parsed {} tracks from GPX", tracks.len());
    Ok(tracks)
}

pub fn load_raw_tracks(path: &Path) -> Result<Vec<RawTrack>> {
    let file = File::open(path)?;
    raw_tracks_from_reader(BufReader::new(file))
}

/// Load and derive every track in a GPX file, coloring them from the configured palette
pub fn load_tracks(path: &Path, config: &TrackerConfig) -> Result<Vec<Track>> {
    let raw_tracks = load_raw_tracks(path)?;
    tracing::info!("Parsed {} tracks from {}", raw_tracks.len(), path.display());

    raw_tracks
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let track = Track::from_raw(raw)?;
            Ok(track.with_meta(TrackMeta {
                name: raw.name.clone(),
                color: config.track_color(index).map(str::to_string),
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>S/Y Shelby</name>
    <trkseg>
      <trkpt lat="45.0" lon="10.0"><time>2016-07-02T12:00:00Z</time></trkpt>
      <trkpt lat="45.05" lon="10.1"><time>2016-07-02T12:05:00Z</time></trkpt>
      <trkpt lat="45.06" lon="10.2"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="45.1" lon="10.2"><ele>2.5</ele><time>2016-07-02T12:30:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

    #[test]
    fn test_parse_segments_and_skip_untimed() {
        let tracks = raw_tracks_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 1);

        let track = &tracks[0];
        assert_eq!(track.name.as_deref(), Some("S/Y Shelby"));
        assert_eq!(track.segments.len(), 2);
        assert_eq!(track.segments[0].points.len(), 2);
        assert_eq!(track.segments[1].points.len(), 1);

        let first = &track.segments[0].points[0];
        assert_eq!(first.longitude, 10.0);
        assert_eq!(first.latitude, 45.0);
        assert_eq!(first.time.to_rfc3339(), "2016-07-02T12:00:00+00:00");
        assert_eq!(track.segments[1].points[0].elevation, Some(2.5));
    }

    #[test]
    fn test_invalid_document() {
        let result = raw_tracks_from_reader("not xml at all".as_bytes());
        assert!(matches!(result, Err(TrackerError::Gpx(_))));
    }
}
