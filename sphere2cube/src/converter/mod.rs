//! End-to-end conversion of a panorama into cube tile pyramids.
//!
//! ```text
//!  source file ──▶ SourceImage ──▶ Equirect ──▶ Projector ──▶ face image
//!                                     │             │             │
//!                                     ▼             ▼             ▼
//!                            equirect preview  cross preview  (watermark)
//!                                                                 │
//!                                                                 ▼
//!                                                     PyramidGenerator ──▶ tiles
//! ```
//!
//! Faces are processed one after another; each face image is dropped once
//! its pyramid is written, so peak memory is one face plus its first
//! downscale on top of the decoded source.

mod error;
mod source;

pub use error::ConvertError;
pub use source::SourceImage;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{ConvertConfig, Watermark};
use crate::pixel::PixelSource;
use crate::progress::{Progress, Stage};
use crate::projection::{Face, Projector};
use crate::psd::DecodeOptions;
use crate::pyramid::PyramidGenerator;
use crate::raster::{Placement, RasterImage};

/// File name stem of the cross preview.
pub const CROSS_PREVIEW_NAME: &str = "preview";

/// File name stem of the equirectangular preview.
pub const EQUIRECT_PREVIEW_NAME: &str = "equirect";

/// What a conversion produced, for downstream viewer and packaging steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Edge of each full-resolution face.
    pub face_edge: u32,
    pub tile_size: u32,
    /// Index of the finest pyramid level.
    pub max_level: u32,
    /// Face edge at each level, coarsest first.
    pub level_edges: Vec<u32>,
    /// Faces converted, in order.
    pub faces: Vec<Face>,
    /// Number of tiles written across all faces.
    pub tiles_written: usize,
    /// Every file written (previews, face images, tiles).
    pub output_files: Vec<PathBuf>,
}

/// Runs conversions with one validated configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
    progress: Progress,
}

impl Converter {
    /// Create a converter, rejecting invalid configuration up front.
    pub fn new(config: ConvertConfig) -> Result<Self, ConvertError> {
        config.validate()?;
        Ok(Self {
            config,
            progress: Progress::none(),
        })
    }

    /// Attach a progress handle passed to every stage.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Load `source` and write all outputs under `out_dir`.
    pub fn convert(&self, source: &Path, out_dir: &Path) -> Result<ConversionSummary, ConvertError> {
        let options = DecodeOptions::default()
            .with_threads(self.config.decode_threads)
            .with_progress(self.progress.clone());
        let image = SourceImage::open(source, &options)?.with_background(self.config.background);
        self.convert_source(image, out_dir)
    }

    /// Convert an already-loaded source.
    ///
    /// The source's own background is used for uncovered areas.
    pub fn convert_source<S: PixelSource>(
        &self,
        source: S,
        out_dir: &Path,
    ) -> Result<ConversionSummary, ConvertError> {
        if source.width() == 0 || source.height() == 0 {
            return Err(ConvertError::EmptySource {
                width: source.width(),
                height: source.height(),
            });
        }

        let started = Instant::now();
        fs::create_dir_all(out_dir)?;

        let config = &self.config;
        let ext = config.format.extension();
        let quality = config.format.quality();
        let projector =
            Projector::new(source, config.angle, config.pitch).with_progress(self.progress.clone());
        let face_edge = config
            .face_edge
            .unwrap_or_else(|| projector.default_face_edge());
        if face_edge == 0 {
            return Err(ConvertError::EmptySource {
                width: projector.view().outer_width(),
                height: projector.view().outer_height(),
            });
        }

        info!(
            outer_width = projector.view().outer_width(),
            outer_height = projector.view().outer_height(),
            face_edge,
            tile_size = config.tile_size,
            faces = config.faces.len(),
            "Starting conversion"
        );

        let mut output_files = Vec::new();

        if let Some(width) = config.preview.cross_width {
            let path = out_dir.join(format!("{}.{}", CROSS_PREVIEW_NAME, ext));
            projector.render_preview(width).write(&path, quality)?;
            output_files.push(path);
        }

        if let Some(max) = config.preview.equirect_max {
            let path = out_dir.join(format!("{}.{}", EQUIRECT_PREVIEW_NAME, ext));
            self.progress.begin(Stage::EquirectPreview, 1);
            RasterImage::downscale_to_fit(projector.view(), max, &self.progress)?
                .write(&path, quality)?;
            self.progress.finish(Stage::EquirectPreview, 1);
            output_files.push(path);
        }

        let watermark = config
            .watermark
            .as_ref()
            .filter(|_| config.faces.contains(&Face::Bottom))
            .map(|w| load_watermark(w, face_edge))
            .transpose()?;

        let generator = PyramidGenerator::new(config.tile_size, config.format)
            .with_template(config.tile_path.clone())
            .with_progress(self.progress.clone());
        let mut report = None;
        let mut tiles_written = 0;

        for &face in &config.faces {
            let mut image = projector.render_face(face, face_edge);

            if face == Face::Bottom {
                if let Some((mark, placement)) = &watermark {
                    let x = (face_edge as i64 - mark.width() as i64) / 2;
                    let y = (face_edge as i64 - mark.height() as i64) / 2;
                    image.compose(mark, x, y, *placement);
                    debug!(x, y, ?placement, "Watermark applied");
                }
            }

            if config.write_faces {
                let path = out_dir.join(format!("face_{}.{}", face.prefix(), ext));
                image.write(&path, quality)?;
                output_files.push(path);
            }

            let face_report = generator.generate(&image, face, out_dir)?;
            tiles_written += face_report.tiles.len();
            output_files.extend(face_report.tiles.iter().cloned());
            report = Some(face_report);
        }

        let (max_level, level_edges) = report
            .map(|r| (r.max_level, r.level_edges))
            .unwrap_or_default();

        info!(
            tiles = tiles_written,
            files = output_files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Conversion complete"
        );

        Ok(ConversionSummary {
            face_edge,
            tile_size: config.tile_size,
            max_level,
            level_edges,
            faces: config.faces.clone(),
            tiles_written,
            output_files,
        })
    }
}

/// Load the watermark and scale it to its share of the face edge.
fn load_watermark(
    watermark: &Watermark,
    face_edge: u32,
) -> Result<(RasterImage, Placement), ConvertError> {
    let image = RasterImage::load(&watermark.path)?;
    if image.width() == 0 {
        warn!(path = %watermark.path.display(), "Watermark image is empty");
        return Ok((image, watermark.placement));
    }
    let target = face_edge as f64 * watermark.scale;
    let scaled = image.scale_by_factor(target / image.width() as f64);
    debug!(
        path = %watermark.path.display(),
        width = scaled.width(),
        height = scaled.height(),
        "Watermark loaded"
    );
    Ok((scaled, watermark.placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::pixel::Pixel;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, color: Pixel) -> RasterImage {
        let mut image = RasterImage::new(width, height);
        image.fill(color);
        image
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Converter::new(ConvertConfig::default().with_tile_size(0)).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_default_edge_ignores_angular_coverage() {
        let dir = TempDir::new().unwrap();
        let converter = Converter::new(
            ConvertConfig::default()
                .with_angle(180.0)
                .with_faces([Face::Front]),
        )
        .unwrap();

        let summary = converter
            .convert_source(solid(100, 50, Pixel::WHITE), dir.path())
            .unwrap();

        assert_eq!(summary.face_edge, 25);
        assert_eq!(summary.level_edges, vec![25]);
        let tile = RasterImage::load(dir.path().join("1/f0_0.png")).unwrap();
        assert_eq!((tile.width(), tile.height()), (25, 25));
    }

    #[test]
    fn test_default_edge_from_source_width() {
        let dir = TempDir::new().unwrap();
        let converter = Converter::new(
            ConvertConfig::default()
                .with_tile_size(16)
                .with_faces([Face::Front]),
        )
        .unwrap();

        let summary = converter
            .convert_source(solid(64, 32, Pixel::WHITE), dir.path())
            .unwrap();

        assert_eq!(summary.face_edge, 16);
        assert_eq!(summary.max_level, 0);
        assert_eq!(summary.tiles_written, 1);
    }

    #[test]
    fn test_previews_and_face_images_written() {
        let dir = TempDir::new().unwrap();
        let converter = Converter::new(
            ConvertConfig::default()
                .with_tile_size(8)
                .with_face_edge(8)
                .with_faces([Face::Left, Face::Right])
                .with_cross_preview(16)
                .with_equirect_preview(8)
                .with_face_images(true),
        )
        .unwrap();

        let summary = converter
            .convert_source(solid(32, 16, Pixel::rgb(5, 6, 7)), dir.path())
            .unwrap();

        let preview = RasterImage::load(dir.path().join("preview.png")).unwrap();
        assert_eq!((preview.width(), preview.height()), (16, 12));
        let equirect = RasterImage::load(dir.path().join("equirect.png")).unwrap();
        assert_eq!((equirect.width(), equirect.height()), (8, 4));
        assert!(dir.path().join("face_l.png").exists());
        assert!(dir.path().join("face_r.png").exists());
        assert!(!dir.path().join("face_f.png").exists());
        assert_eq!(summary.output_files.len(), 2 + 2 + 2);
    }

    #[test]
    fn test_watermark_is_centred_on_bottom_face() {
        let dir = TempDir::new().unwrap();
        let mark_path = dir.path().join("mark.png");
        solid(4, 4, Pixel::rgb(255, 0, 0)).write(&mark_path, 0).unwrap();

        let out = dir.path().join("out");
        let converter = Converter::new(
            ConvertConfig::default()
                .with_tile_size(16)
                .with_face_edge(16)
                .with_faces([Face::Front, Face::Bottom])
                .with_watermark(
                    Watermark::new(&mark_path)
                        .with_placement(Placement::Above)
                        .with_scale(0.5),
                ),
        )
        .unwrap();

        converter
            .convert_source(solid(64, 32, Pixel::rgb(0, 0, 255)), &out)
            .unwrap();

        let bottom = RasterImage::load(out.join("1/d0_0.png")).unwrap();
        assert_eq!(bottom.get_pixel(8, 8), Pixel::rgb(255, 0, 0));
        assert_eq!(bottom.get_pixel(4, 4), Pixel::rgb(255, 0, 0));
        assert_eq!(bottom.get_pixel(3, 3), Pixel::rgb(0, 0, 255));
        assert_eq!(bottom.get_pixel(12, 12), Pixel::rgb(0, 0, 255));

        let front = RasterImage::load(out.join("1/f0_0.png")).unwrap();
        assert_eq!(front.get_pixel(8, 8), Pixel::rgb(0, 0, 255));
    }

    #[test]
    fn test_jpeg_tiles_use_jpg_extension() {
        let dir = TempDir::new().unwrap();
        let converter = Converter::new(
            ConvertConfig::default()
                .with_tile_size(8)
                .with_face_edge(8)
                .with_format(OutputFormat::jpeg())
                .with_faces([Face::Top]),
        )
        .unwrap();

        converter
            .convert_source(solid(16, 8, Pixel::WHITE), dir.path())
            .unwrap();

        assert!(dir.path().join("1/u0_0.jpg").exists());
    }
}
