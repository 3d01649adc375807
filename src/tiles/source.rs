// src/tiles/source.rs
//! Slippy-map tile sources and Web Mercator tile math

use super::fetch::{HttpFetcher, TileFetcher, DEFAULT_USER_AGENT};
use crate::error::{Result, TrackerError};
use crate::track::Bounds;
use image::DynamicImage;
use serde::Serialize;
use std::f64::consts::PI;

/// Half the width of the Web Mercator plane in meters
const MERCATOR_HALF_EXTENT: f64 = 20_037_508.342_789_244;

/// Latitude limit of the Web Mercator projection
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Deepest zoom level any slippy-map server publishes
pub const MAX_ZOOM: u8 = 22;

/// Reject zoom levels no tile server publishes
pub fn check_zoom(zoom: u8) -> Result<u8> {
    if zoom > MAX_ZOOM {
        return Err(TrackerError::InvalidArgument(format!(
            "zoom {} is outside 0..={}",
            zoom, MAX_ZOOM
        )));
    }
    Ok(zoom)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// Rectangle in the source's projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Where the renderer should place row zero of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Luma,
}

impl PixelFormat {
    pub fn convert(self, image: DynamicImage) -> DynamicImage {
        match self {
            PixelFormat::Rgb => DynamicImage::ImageRgb8(image.to_rgb8()),
            PixelFormat::Rgba => DynamicImage::ImageRgba8(image.to_rgba8()),
            PixelFormat::Luma => DynamicImage::ImageLuma8(image.to_luma8()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileImage {
    pub image: DynamicImage,
    pub extent: Extent,
    pub orientation: Orientation,
}

/// A remote source of map tiles.
///
/// Only `get_image` touches the network; everything else is pure addressing.
pub trait TileSource {
    /// Stable identifier, used as the cache directory name
    fn name(&self) -> String;

    fn crs(&self) -> &str {
        "EPSG:3857"
    }

    fn image_url(&self, tile: TileCoord) -> String;

    fn tile_extent(&self, tile: TileCoord) -> Extent {
        mercator_tile_extent(tile)
    }

    fn desired_tile_form(&self) -> PixelFormat {
        PixelFormat::Rgb
    }

    /// Download and decode one tile without any caching
    fn get_image(&self, tile: TileCoord) -> Result<TileImage> {
        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None)?;
        let mut bytes = Vec::new();
        fetcher.fetch(&self.image_url(tile), &mut bytes)?;
        let image = image::load_from_memory(&bytes)?;
        Ok(TileImage {
            image: self.desired_tile_form().convert(image),
            extent: self.tile_extent(tile),
            orientation: Orientation::Lower,
        })
    }
}

impl<T: TileSource + ?Sized> TileSource for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn crs(&self) -> &str {
        (**self).crs()
    }

    fn image_url(&self, tile: TileCoord) -> String {
        (**self).image_url(tile)
    }

    fn tile_extent(&self, tile: TileCoord) -> Extent {
        (**self).tile_extent(tile)
    }

    fn desired_tile_form(&self) -> PixelFormat {
        (**self).desired_tile_form()
    }

    fn get_image(&self, tile: TileCoord) -> Result<TileImage> {
        (**self).get_image(tile)
    }
}

/// Stamen terrain background, served by Stadia Maps
#[derive(Debug, Clone, Default)]
pub struct StamenTerrain;

impl TileSource for StamenTerrain {
    fn name(&self) -> String {
        "stamenterrain".to_string()
    }

    fn image_url(&self, tile: TileCoord) -> String {
        format!(
            "https://tiles.stadiamaps.com/tiles/stamen_terrain_background/{}/{}/{}.png",
            tile.z, tile.x, tile.y
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenStreetMap;

impl TileSource for OpenStreetMap {
    fn name(&self) -> String {
        "openstreetmap".to_string()
    }

    fn image_url(&self, tile: TileCoord) -> String {
        format!("https://tile.openstreetmap.org/{}/{}/{}.png", tile.z, tile.x, tile.y)
    }
}

/// Look up a built-in source by its cache name
pub fn source_by_name(name: &str) -> Result<Box<dyn TileSource>> {
    match name.to_ascii_lowercase().as_str() {
        "stamenterrain" => Ok(Box::new(StamenTerrain)),
        "openstreetmap" | "osm" => Ok(Box::new(OpenStreetMap)),
        other => Err(TrackerError::Config(format!("Unknown tile source: {}", other))),
    }
}

/// Extent of a tile in Web Mercator meters
pub fn mercator_tile_extent(tile: TileCoord) -> Extent {
    let size = 2.0 * MERCATOR_HALF_EXTENT / 2_f64.powi(tile.z as i32);
    let x_min = -MERCATOR_HALF_EXTENT + tile.x as f64 * size;
    let y_max = MERCATOR_HALF_EXTENT - tile.y as f64 * size;
    Extent {
        x_min,
        x_max: x_min + size,
        y_min: y_max - size,
        y_max,
    }
}

/// Calculate tile coordinates from lat/lon and zoom level
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = 2_f64.powi(zoom as i32);
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

/// Calculate lat/lon of the north-west corner of a tile
pub fn tile_to_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2_f64.powi(zoom as i32);
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat_rad = ((1.0 - 2.0 * y as f64 / n) * PI).sinh().atan();
    (lat_rad.to_degrees(), lon)
}

/// Every tile at `zoom` that intersects `bounds`, row by row
pub fn tiles_covering(bounds: &Bounds, zoom: u8) -> Result<Vec<TileCoord>> {
    let zoom = check_zoom(zoom)?;
    let (x0, y0) = lat_lon_to_tile(bounds.max_lat, bounds.min_lon, zoom);
    let (x1, y1) = lat_lon_to_tile(bounds.min_lat, bounds.max_lon, zoom);

    let columns = (x1 - x0) as usize + 1;
    let rows = (y1 - y0) as usize + 1;
    let mut tiles = Vec::with_capacity(columns.saturating_mul(rows));
    for y in y0..=y1 {
        for x in x0..=x1 {
            tiles.push(TileCoord::new(x, y, zoom));
        }
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_coordinates() {
        let (x, y) = lat_lon_to_tile(42.438878, -71.119277, 12);
        assert!(x > 0 && y > 0);

        let (lat, lon) = tile_to_lat_lon(x, y, 12);
        assert!((lat - 42.438878).abs() < 0.1);
        assert!((lon - (-71.119277)).abs() < 0.1);
    }

    #[test]
    fn test_tile_coordinates_clamped_at_edges() {
        assert_eq!(lat_lon_to_tile(90.0, 180.0, 2), (3, 0));
        assert_eq!(lat_lon_to_tile(-90.0, -180.0, 2), (0, 3));
    }

    #[test]
    fn test_mercator_extent() {
        let world = mercator_tile_extent(TileCoord::new(0, 0, 0));
        assert!((world.x_min + MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.x_max - MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.y_min + MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.y_max - MERCATOR_HALF_EXTENT).abs() < 1e-6);

        let quarter = mercator_tile_extent(TileCoord::new(1, 1, 1));
        assert!(quarter.x_min.abs() < 1e-6);
        assert!(quarter.y_max.abs() < 1e-6);
    }

    #[test]
    fn test_tiles_covering_bounds() {
        let bounds = Bounds { min_lon: 10.0, max_lon: 10.1, min_lat: 45.0, max_lat: 45.05 };
        let tiles = tiles_covering(&bounds, 12).unwrap();
        assert!(!tiles.is_empty());

        let (x, y) = lat_lon_to_tile(45.02, 10.05, 12);
        assert!(tiles.contains(&TileCoord::new(x, y, 12)));
        assert!(tiles.iter().all(|t| t.z == 12));
    }

    #[test]
    fn test_zoom_beyond_published_levels_is_rejected() {
        let bounds = Bounds { min_lon: 10.0, max_lon: 10.1, min_lat: 45.0, max_lat: 45.05 };
        assert!(matches!(
            tiles_covering(&bounds, 40),
            Err(TrackerError::InvalidArgument(_))
        ));
        assert!(matches!(check_zoom(MAX_ZOOM + 1), Err(TrackerError::InvalidArgument(_))));
        assert_eq!(check_zoom(MAX_ZOOM).unwrap(), MAX_ZOOM);

        let deepest = tiles_covering(&bounds, MAX_ZOOM).unwrap();
        assert!(deepest.len() > 1);
        assert!(deepest.iter().all(|t| t.x < 1 << MAX_ZOOM && t.y < 1 << MAX_ZOOM));
    }

    #[test]
    fn test_source_urls() {
        let tile = TileCoord::new(2154, 1459, 12);
        assert_eq!(
            OpenStreetMap.image_url(tile),
            "https://tile.openstreetmap.org/12/2154/1459.png"
        );
        assert!(StamenTerrain.image_url(tile).ends_with("/12/2154/1459.png"));
        assert_eq!(StamenTerrain.crs(), "EPSG:3857");
    }

    #[test]
    fn test_source_by_name() {
        assert_eq!(source_by_name("StamenTerrain").unwrap().name(), "stamenterrain");
        assert_eq!(source_by_name("osm").unwrap().name(), "openstreetmap");
        assert!(matches!(source_by_name("bing"), Err(TrackerError::Config(_))));
    }
}
