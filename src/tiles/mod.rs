// src/tiles/mod.rs
//! Map tile sources and on-disk caching

mod cache;
mod fetch;
mod source;

pub use cache::{CacheStats, CachedTiler, PrefetchReport};
pub use fetch::{HttpFetcher, TileFetcher, DEFAULT_USER_AGENT};
pub use source::{
    check_zoom, lat_lon_to_tile, mercator_tile_extent, source_by_name, tile_to_lat_lon,
    tiles_covering, Extent, OpenStreetMap, Orientation, PixelFormat, StamenTerrain, TileCoord,
    TileImage, TileSource, MAX_ZOOM,
};
