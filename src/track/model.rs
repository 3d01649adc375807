// src/track/model.rs
//! Track model: raw GPS points in, derived bearing/speed and extents out

use super::geo::{compass_bearing, haversine_distance};
use crate::error::{Result, TrackerError};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One timestamped fix as read from a GPS log
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
    pub time: DateTime<Utc>,
}

impl RawPoint {
    pub fn new(longitude: f64, latitude: f64, time: DateTime<Utc>) -> Self {
        Self {
            longitude,
            latitude,
            elevation: None,
            time,
        }
    }

    /// Distance in meters, including the elevation change when both points have one
    pub fn distance_to(&self, other: &RawPoint) -> f64 {
        let flat = haversine_distance(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        );
        match (self.elevation, other.elevation) {
            (Some(a), Some(b)) => (flat * flat + (b - a) * (b - a)).sqrt(),
            _ => flat,
        }
    }

    /// Speed in m/s travelled from `previous` to this point
    pub fn speed_between(&self, previous: &RawPoint) -> f64 {
        let millis = (self.time - previous.time).num_milliseconds().abs();
        if millis == 0 {
            return 0.0;
        }
        self.distance_to(previous) / (millis as f64 / 1000.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSegment {
    pub points: Vec<RawPoint>,
}

/// A track as delivered by the GPX reader, before derivation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrack {
    pub name: Option<String>,
    pub segments: Vec<RawSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub time: DateTime<Utc>,
}

/// Bearing (degrees) and speed (m/s) of travel into a point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PointInfo {
    pub bearing: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Inverted bounds that any real point tightens
    pub fn empty() -> Self {
        Self {
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    fn extend(range: &mut Option<TimeRange>, time: DateTime<Utc>) {
        match range {
            Some(r) => {
                r.start = r.start.min(time);
                r.end = r.end.max(time);
            }
            None => *range = Some(TimeRange { start: time, end: time }),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Halfway between start and end, the default moment to display
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + self.duration() / 2
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Display attributes carried for the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackMeta {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// What a single rendered moment shows for one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub position: TrackPoint,
    pub info: PointInfo,
    pub points_shown: usize,
}

/// An immutable track with per-point navigation data.
///
/// `points` and `info` are index-aligned. The first point of every segment
/// has a zero bearing and speed.
#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<TrackPoint>,
    info: Vec<PointInfo>,
    segment_starts: Vec<usize>,
    bounds: Bounds,
    time_range: Option<TimeRange>,
    meta: TrackMeta,
}

impl Track {
    pub fn from_raw(raw: &RawTrack) -> Result<Self> {
        let capacity = raw.segments.iter().map(|s| s.points.len()).sum();
        let mut points = Vec::with_capacity(capacity);
        let mut info = Vec::with_capacity(capacity);
        let mut segment_starts = Vec::new();
        let mut bounds = Bounds::empty();
        let mut time_range = None;

        for segment in &raw.segments {
            let mut previous: Option<&RawPoint> = None;
            for point in &segment.points {
                let derived = match previous {
                    None => {
                        segment_starts.push(points.len());
                        PointInfo::default()
                    }
                    Some(prev) => PointInfo {
                        bearing: compass_bearing(
                            (prev.latitude, prev.longitude),
                            (point.latitude, point.longitude),
                        )?,
                        speed: point.speed_between(prev),
                    },
                };

                points.push(TrackPoint {
                    longitude: point.longitude,
                    latitude: point.latitude,
                    time: point.time,
                });
                info.push(derived);
                bounds.extend(point.longitude, point.latitude);
                TimeRange::extend(&mut time_range, point.time);
                previous = Some(point);
            }
        }

        Ok(Self {
            points,
            info,
            segment_starts,
            bounds,
            time_range,
            meta: TrackMeta {
                name: raw.name.clone(),
                color: None,
            },
        })
    }

    pub fn with_meta(mut self, meta: TrackMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn meta(&self) -> &TrackMeta {
        &self.meta
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn info(&self) -> &[PointInfo] {
        &self.info
    }

    /// Index of the first point of every non-empty segment
    pub fn segment_starts(&self) -> &[usize] {
        &self.segment_starts
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        if self.bounds.is_empty() {
            None
        } else {
            Some(self.bounds)
        }
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range
    }

    /// `(lon, lat)` of every point recorded strictly before `time`
    pub fn positions_before(&self, time: DateTime<Utc>) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .filter(move |p| p.time < time)
            .map(|p| (p.longitude, p.latitude))
    }

    pub fn lons_before(&self, time: DateTime<Utc>) -> impl Iterator<Item = f64> + '_ {
        self.positions_before(time).map(|(lon, _)| lon)
    }

    pub fn lats_before(&self, time: DateTime<Utc>) -> impl Iterator<Item = f64> + '_ {
        self.positions_before(time).map(|(_, lat)| lat)
    }

    fn index_before(&self, time: DateTime<Utc>, back: usize) -> Result<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.time < time)
            .map(|(i, _)| i)
            .nth_back(back)
            .ok_or_else(|| {
                TrackerError::OutOfRange(format!(
                    "fewer than {} points recorded before {}",
                    back + 1,
                    time.to_rfc3339()
                ))
            })
    }

    /// The `back`-th most recent point strictly before `time`
    pub fn last_position_at_or_before(
        &self,
        time: DateTime<Utc>,
        back: usize,
    ) -> Result<TrackPoint> {
        let index = self.index_before(time, back)?;
        Ok(self.points[index])
    }

    /// Bearing and speed paired with the last point strictly before `time`
    pub fn last_info_at_or_before(&self, time: DateTime<Utc>) -> Result<PointInfo> {
        let index = self.index_before(time, 0)?;
        Ok(self.info[index])
    }

    /// Position and info of the `back`-th most recent point before `time`,
    /// both taken from the same index
    pub fn snapshot_at(&self, time: DateTime<Utc>, back: usize) -> Result<Snapshot> {
        let index = self.index_before(time, back)?;
        Ok(Snapshot {
            position: self.points[index],
            info: self.info[index],
            points_shown: self.points.iter().filter(|p| p.time < time).count(),
        })
    }
}
