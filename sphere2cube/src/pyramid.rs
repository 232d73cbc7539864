//! Multi-resolution tile pyramids.
//!
//! A face image is cut into fixed-size tiles at its full resolution, then
//! halved and cut again, until a single tile covers the whole face. Level 0
//! is the coarsest; on disk levels are numbered from 1.
//!
//! ```text
//!  level 2 (2048²)  ──halve──▶  level 1 (1024²)  ──halve──▶  level 0 (512²)
//!   4×4 tiles                    2×2 tiles                    1 tile
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{OutputFormat, TilePathTemplate};
use crate::pixel::PixelSource;
use crate::progress::{Progress, Stage};
use crate::projection::Face;
use crate::raster::{RasterError, RasterImage};

/// Number of halvings (rounding each step) needed to bring `edge` down to
/// at most `tile_size`. This is also the index of the finest level.
pub fn max_level(edge: u32, tile_size: u32) -> u32 {
    let tile_size = tile_size.max(1);
    let mut current = edge;
    let mut level = 0;
    while current > tile_size {
        current = halve(current);
        level += 1;
    }
    level
}

/// Face edge at every level, coarsest first.
pub fn level_edges(edge: u32, tile_size: u32) -> Vec<u32> {
    let levels = max_level(edge, tile_size);
    let mut edges = Vec::with_capacity(levels as usize + 1);
    let mut current = edge;
    edges.push(current);
    for _ in 0..levels {
        current = halve(current);
        edges.push(current);
    }
    edges.reverse();
    edges
}

/// Tile columns and rows covering a `width` × `height` image.
pub fn tile_grid(width: u32, height: u32, tile_size: u32) -> (u32, u32) {
    let tile_size = tile_size.max(1);
    (width.div_ceil(tile_size), height.div_ceil(tile_size))
}

fn halve(edge: u32) -> u32 {
    (edge as f64 * 0.5).round() as u32
}

/// Result of generating one face's pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidReport {
    pub face: Face,
    /// Index of the finest level.
    pub max_level: u32,
    /// Image edge (width) at each level, coarsest first.
    pub level_edges: Vec<u32>,
    /// Every tile written, in write order.
    pub tiles: Vec<PathBuf>,
}

/// Slices face images into tile pyramids on disk.
#[derive(Debug, Clone)]
pub struct PyramidGenerator {
    tile_size: u32,
    format: OutputFormat,
    template: TilePathTemplate,
    progress: Progress,
}

impl PyramidGenerator {
    pub fn new(tile_size: u32, format: OutputFormat) -> Self {
        Self {
            tile_size,
            format,
            template: TilePathTemplate::default(),
            progress: Progress::none(),
        }
    }

    pub fn with_template(mut self, template: TilePathTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Write every level of `image` for `face` under `out_dir`.
    ///
    /// Works from the finest level down, halving the image between levels,
    /// so the face is only ever projected once.
    pub fn generate(
        &self,
        image: &RasterImage,
        face: Face,
        out_dir: &Path,
    ) -> Result<PyramidReport, RasterError> {
        if self.tile_size == 0 {
            return Err(RasterError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
                reason: "tile size must be greater than zero".to_string(),
            });
        }

        let started = Instant::now();
        let max_level = max_level(image.width().max(image.height()), self.tile_size);
        let mut level_edges = Vec::with_capacity(max_level as usize + 1);
        let mut tiles = Vec::new();
        let mut scaled: Option<RasterImage> = None;

        for level in (0..=max_level).rev() {
            let current = scaled.as_ref().unwrap_or(image);
            level_edges.push(current.width());
            self.write_level(current, face, level, out_dir, &mut tiles)?;

            if level > 0 {
                let next = current.scale_by_factor_with_progress(0.5, &self.progress);
                scaled = Some(next);
            }
        }
        level_edges.reverse();

        info!(
            face = face.name(),
            levels = max_level + 1,
            tiles = tiles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pyramid written"
        );

        Ok(PyramidReport {
            face,
            max_level,
            level_edges,
            tiles,
        })
    }

    fn write_level(
        &self,
        image: &RasterImage,
        face: Face,
        level: u32,
        out_dir: &Path,
        written: &mut Vec<PathBuf>,
    ) -> Result<(), RasterError> {
        let (columns, rows) = tile_grid(image.width(), image.height(), self.tile_size);
        let total = columns as u64 * rows as u64;
        let stage = Stage::Tiles { face, level };
        debug!(face = face.name(), level, columns, rows, "Writing level");
        self.progress.begin(stage, total);

        let mut completed = 0;
        for y in 0..rows {
            for x in 0..columns {
                let left = x * self.tile_size;
                let top = y * self.tile_size;
                let width = self.tile_size.min(image.width() - left);
                let height = self.tile_size.min(image.height() - top);
                let tile = image.crop(left, top, width, height);

                let path = out_dir.join(self.template.render(
                    level + 1,
                    face,
                    x,
                    y,
                    self.format.extension(),
                ));
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                tile.write(&path, self.format.quality())?;
                written.push(path);

                completed += 1;
                self.progress.update(stage, total, completed);
            }
        }
        Ok(())
    }
}
