// src/lib.rs
//! Regatta Tracker Library
//!
//! Derives bearing, speed and extents from GPX sailing tracks and keeps an
//! on-disk cache of the map tiles the race course is drawn on.

pub mod config;
pub mod error;
pub mod report;
pub mod tiles;
pub mod track;

// Re-export main types for convenience
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use tiles::{CachedTiler, TileCoord, TileSource};
pub use track::{Track, TrackMeta};
