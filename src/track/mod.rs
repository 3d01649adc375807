// src/track/mod.rs
//! Sailing track ingestion and derived navigation data

pub mod geo;
pub mod gpx_input;
pub mod model;

pub use model::{
    Bounds, PointInfo, RawPoint, RawSegment, RawTrack, Snapshot, TimeRange, Track, TrackMeta,
    TrackPoint,
};
