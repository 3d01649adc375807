// src/tiles/cache.rs
//! On-disk tile caching that decorates any tile source

use super::fetch::{HttpFetcher, TileFetcher};
use super::source::{Extent, Orientation, PixelFormat, TileCoord, TileImage, TileSource};
use crate::error::Result;
use image::ImageReader;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const TILE_EXTENSION: &str = "png";

/// Wraps a [`TileSource`] so each tile is downloaded at most once.
///
/// Tiles live at `<cache_root>/<source name>/<x>_<y>_<z>.png` and are never
/// expired. All other source capabilities pass straight through.
pub struct CachedTiler<S, F = HttpFetcher> {
    inner: S,
    fetcher: F,
    cache_root: PathBuf,
}

impl<S: TileSource> CachedTiler<S, HttpFetcher> {
    pub fn with_http(
        inner: S,
        cache_root: impl Into<PathBuf>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self::new(inner, cache_root, HttpFetcher::new(user_agent, timeout)?))
    }
}

impl<S: TileSource, F: TileFetcher> CachedTiler<S, F> {
    pub fn new(inner: S, cache_root: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            inner,
            fetcher,
            cache_root: cache_root.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(self.inner.name())
    }

    pub fn tile_path(&self, tile: TileCoord) -> PathBuf {
        Self::tile_file(&self.cache_dir(), tile)
    }

    fn tile_file(cache_dir: &Path, tile: TileCoord) -> PathBuf {
        cache_dir.join(format!("{}_{}_{}.{}", tile.x, tile.y, tile.z, TILE_EXTENSION))
    }

    pub fn is_cached(&self, tile: TileCoord) -> bool {
        self.tile_path(tile).exists()
    }

    /// Make sure the tile is on disk. Returns `true` when it had to be fetched.
    pub fn ensure_cached(&self, tile: TileCoord) -> Result<bool> {
        let cache_dir = self.cache_dir();
        fs::create_dir_all(&cache_dir)?;

        let path = Self::tile_file(&cache_dir, tile);
        if path.exists() {
            tracing::debug!("Tile {:?} served from {}", tile, path.display());
            return Ok(false);
        }

        let url = self.inner.image_url(tile);
        let partial = path.with_extension(format!("{}.part", TILE_EXTENSION));
        if let Err(e) = self.download(&url, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &path)?;

        tracing::info!("Cached tile {:?} from {}", tile, url);
        Ok(true)
    }

    fn download(&self, url: &str, partial: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(partial)?);
        self.fetcher.fetch(url, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Fetch every tile in `tiles` that is not on disk yet
    pub fn prefetch<I>(&self, tiles: I) -> Result<PrefetchReport>
    where
        I: IntoIterator<Item = TileCoord>,
    {
        let mut report = PrefetchReport::default();
        for tile in tiles {
            if self.ensure_cached(tile)? {
                report.fetched += 1;
            } else {
                report.cached += 1;
            }
        }
        Ok(report)
    }

    /// Get cache statistics for this source's directory
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        let cache_dir = self.cache_dir();
        if !cache_dir.exists() {
            return Ok(stats);
        }

        for entry in fs::read_dir(&cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TILE_EXTENSION) {
                continue;
            }
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                stats.disk_tiles += 1;
                stats.disk_bytes += metadata.len();
            }
        }
        Ok(stats)
    }
}

impl<S: TileSource, F: TileFetcher> TileSource for CachedTiler<S, F> {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn crs(&self) -> &str {
        self.inner.crs()
    }

    fn image_url(&self, tile: TileCoord) -> String {
        self.inner.image_url(tile)
    }

    fn tile_extent(&self, tile: TileCoord) -> Extent {
        self.inner.tile_extent(tile)
    }

    fn desired_tile_form(&self) -> PixelFormat {
        self.inner.desired_tile_form()
    }

    fn get_image(&self, tile: TileCoord) -> Result<TileImage> {
        self.ensure_cached(tile)?;
        // servers do not always send PNG behind a .png name
        let image = ImageReader::open(self.tile_path(tile))?
            .with_guessed_format()?
            .decode()?;
        Ok(TileImage {
            image: self.desired_tile_form().convert(image),
            extent: self.tile_extent(tile),
            orientation: Orientation::Lower,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub fetched: usize,
    pub cached: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub disk_tiles: usize,
    pub disk_bytes: u64,
}

impl CacheStats {
    pub fn disk_size_mb(&self) -> f64 {
        self.disk_bytes as f64 / 1_048_576.0
    }
}
