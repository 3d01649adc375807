use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use regatta_tracker::tiles::{
    tiles_covering, CachedTiler, PixelFormat, StamenTerrain, TileCoord, TileFetcher, TileSource,
};
use regatta_tracker::track::Bounds;
use regatta_tracker::Result;
use std::cell::Cell;
use std::io::{Cursor, Write};
use tempdir::TempDir;

struct CountingFetcher {
    body: Vec<u8>,
    calls: Cell<usize>,
}

impl CountingFetcher {
    fn new() -> Self {
        let tile = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128]));
        let mut body = Cursor::new(Vec::new());
        tile.write_to(&mut body, ImageFormat::Png).unwrap();
        Self::serving(body.into_inner())
    }

    /// Some servers answer a .png URL with JPEG data
    fn jpeg() -> Self {
        let tile = RgbImage::from_pixel(16, 16, Rgb([90, 140, 200]));
        let mut body = Cursor::new(Vec::new());
        tile.write_to(&mut body, ImageFormat::Jpeg).unwrap();
        Self::serving(body.into_inner())
    }

    fn serving(body: Vec<u8>) -> Self {
        Self {
            body,
            calls: Cell::new(0),
        }
    }
}

impl TileFetcher for CountingFetcher {
    fn fetch(&self, _url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.calls.set(self.calls.get() + 1);
        dest.write_all(&self.body)?;
        Ok(self.body.len() as u64)
    }
}

/// A source that wants grayscale tiles
struct GrayTerrain;

impl TileSource for GrayTerrain {
    fn name(&self) -> String {
        "grayterrain".to_string()
    }

    fn image_url(&self, tile: TileCoord) -> String {
        StamenTerrain.image_url(tile)
    }

    fn desired_tile_form(&self) -> PixelFormat {
        PixelFormat::Luma
    }
}

#[test]
fn tiles_land_under_the_source_directory() {
    let dir = TempDir::new("tile_cache").unwrap();
    let fetcher = CountingFetcher::new();
    let cache = CachedTiler::new(StamenTerrain, dir.path(), &fetcher);

    let tile = TileCoord::new(2154, 1459, 12);
    let fetched = cache.get_image(tile).unwrap();

    let expected = dir.path().join("stamenterrain").join("2154_1459_12.png");
    assert!(expected.is_file());
    assert_eq!(cache.tile_path(tile), expected);
    assert_eq!(fetched.extent, StamenTerrain.tile_extent(tile));
    assert_eq!(fetched.image.color(), image::ColorType::Rgb8);
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn pixels_follow_the_desired_form() {
    let dir = TempDir::new("tile_cache").unwrap();
    let fetcher = CountingFetcher::new();
    let cache = CachedTiler::new(GrayTerrain, dir.path(), &fetcher);

    let gray = cache.get_image(TileCoord::new(1, 1, 2)).unwrap();
    assert_eq!(gray.image.color(), image::ColorType::L8);
    assert_eq!(gray.image.width(), 8);
}

#[test]
fn jpeg_bodies_decode_from_the_png_path() {
    let dir = TempDir::new("tile_cache").unwrap();
    let fetcher = CountingFetcher::jpeg();
    let cache = CachedTiler::new(StamenTerrain, dir.path(), &fetcher);
    let tile = TileCoord::new(4, 5, 6);

    let fetched = cache.get_image(tile).unwrap();
    assert_eq!(cache.tile_path(tile).extension().unwrap(), "png");
    assert_eq!(fetched.image.width(), 16);
    assert_eq!(fetched.image.color(), image::ColorType::Rgb8);

    let again = cache.get_image(tile).unwrap();
    assert_eq!(again.image.as_bytes(), fetched.image.as_bytes());
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn caches_are_shared_between_instances() {
    let dir = TempDir::new("tile_cache").unwrap();
    let fetcher = CountingFetcher::new();
    let bounds = Bounds { min_lon: 10.0, max_lon: 10.1, min_lat: 45.0, max_lat: 45.05 };
    let tiles = tiles_covering(&bounds, 12).unwrap();

    let first = CachedTiler::new(StamenTerrain, dir.path(), &fetcher);
    let report = first.prefetch(tiles.clone()).unwrap();
    assert_eq!(report.fetched, tiles.len());

    let second = CachedTiler::new(StamenTerrain, dir.path(), &fetcher);
    let report = second.prefetch(tiles.clone()).unwrap();
    assert_eq!(report.fetched, 0);
    assert_eq!(report.cached, tiles.len());
    assert_eq!(fetcher.calls.get(), tiles.len());
}
