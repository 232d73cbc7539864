//! Conversion configuration.
//!
//! [`ConvertConfig`] collects every knob the converter consumes. It is a
//! plain value: build it with `Default` and the `with_*` methods, then call
//! [`ConvertConfig::validate`] before use. Loading and saving configuration
//! is left to callers.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pixel::Pixel;
use crate::projection::Face;
use crate::raster::{Placement, RasterFormat};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default horizontal coverage of the source in degrees.
pub const DEFAULT_ANGLE: f64 = 360.0;

/// Default tile path layout.
pub const DEFAULT_TILE_TEMPLATE: &str = "{level}/{face}{y}_{x}.{ext}";

/// Default watermark width as a fraction of the face edge.
pub const DEFAULT_WATERMARK_SCALE: f64 = 0.25;

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Tile size must be greater than zero")]
    InvalidTileSize,

    #[error("Angle must be in (0, 360] degrees, got {0}")]
    InvalidAngle(f64),

    #[error("Pitch must be in [-90, 90] degrees, got {0}")]
    InvalidPitch(f64),

    #[error("JPEG quality must be at most 100, got {0}")]
    InvalidQuality(u8),

    #[error("Face edge must be greater than zero")]
    InvalidFaceEdge,

    #[error("At least one face must be selected")]
    NoFaces,

    #[error("Preview width must be at least 4, got {0}")]
    InvalidPreviewWidth(u32),

    #[error("Watermark scale must be in (0, 1], got {0}")]
    InvalidWatermarkScale(f64),

    #[error("Invalid tile path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Encoding used for tiles and face images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless with alpha.
    #[default]
    Png,
    /// Lossy without alpha.
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// JPEG at the default quality.
    pub fn jpeg() -> Self {
        OutputFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn extension(self) -> &'static str {
        self.raster_format().extension()
    }

    /// Quality passed to the encoder (ignored for PNG).
    pub fn quality(self) -> u8 {
        match self {
            OutputFormat::Png => 100,
            OutputFormat::Jpeg { quality } => quality,
        }
    }

    pub fn raster_format(self) -> RasterFormat {
        match self {
            OutputFormat::Png => RasterFormat::Png,
            OutputFormat::Jpeg { .. } => RasterFormat::Jpeg,
        }
    }
}

/// Image stamped onto the bottom (nadir) face before tiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    /// Image file to load.
    pub path: PathBuf,
    /// Whether the watermark covers the face or shows through it.
    pub placement: Placement,
    /// Watermark width as a fraction of the face edge.
    pub scale: f64,
}

impl Watermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            placement: Placement::Above,
            scale: DEFAULT_WATERMARK_SCALE,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// Optional preview outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Width of the horizontal-cross preview, if one should be written.
    /// Rounded down to a multiple of 4 so every face cell is square.
    pub cross_width: Option<u32>,
    /// Largest dimension of a downscaled equirectangular preview, if one
    /// should be written.
    pub equirect_max: Option<u32>,
}

/// Tile file layout relative to the output directory.
///
/// Placeholders: `{level}` (directory level, coarsest is 1), `{face}` (face
/// prefix), `{x}` and `{y}` (tile column and row), `{ext}` (file extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePathTemplate {
    pattern: String,
}

impl TilePathTemplate {
    const PLACEHOLDERS: [&'static str; 5] = ["level", "face", "x", "y", "ext"];
    const REQUIRED: [&'static str; 4] = ["level", "face", "x", "y"];

    /// Parse and check a template.
    ///
    /// Every placeholder must be known, and `{level}`, `{face}`, `{x}` and
    /// `{y}` must all appear so that no two tiles share a path.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTemplate {
            template: pattern.to_string(),
            reason,
        };

        let mut seen = Vec::new();
        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
            let name = &after[..close];
            if !Self::PLACEHOLDERS.iter().any(|p| *p == name) {
                return Err(invalid(format!("unknown placeholder '{{{}}}'", name)));
            }
            seen.push(name);
            rest = &after[close + 1..];
        }

        if let Some(missing) = Self::REQUIRED.iter().find(|r| !seen.iter().any(|s| s == *r)) {
            return Err(invalid(format!("missing '{{{}}}'", missing)));
        }
        if Path::new(pattern).is_absolute() {
            return Err(invalid("must be relative".to_string()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Path of one tile relative to the output directory.
    pub fn render(&self, level: u32, face: Face, x: u32, y: u32, ext: &str) -> PathBuf {
        let path = self
            .pattern
            .replace("{level}", &level.to_string())
            .replace("{face}", face.prefix())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{ext}", ext);
        PathBuf::from(path)
    }
}

impl Default for TilePathTemplate {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TILE_TEMPLATE.to_string(),
        }
    }
}

/// Everything needed to turn one source panorama into cube tiles.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Horizontal coverage of the source in degrees.
    pub angle: f64,

    /// Vertical shift of the source in degrees (positive moves it toward
    /// the zenith).
    pub pitch: f64,

    /// Face edge in pixels; `None` derives it from the source width.
    pub face_edge: Option<u32>,

    /// Tile edge in pixels.
    pub tile_size: u32,

    /// Encoding for tiles and face images.
    pub format: OutputFormat,

    /// Colour for areas the source does not cover.
    pub background: Pixel,

    /// Faces to render, in order.
    pub faces: Vec<Face>,

    /// Optional nadir watermark.
    pub watermark: Option<Watermark>,

    /// Optional previews.
    pub preview: PreviewConfig,

    /// Also write each full-resolution face as `face_{prefix}.{ext}`.
    pub write_faces: bool,

    /// Threads for run-length decode (1 decodes inline).
    pub decode_threads: usize,

    /// Tile file layout.
    pub tile_path: TilePathTemplate,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            angle: DEFAULT_ANGLE,
            pitch: 0.0,
            face_edge: None,
            tile_size: DEFAULT_TILE_SIZE,
            format: OutputFormat::Png,
            background: Pixel::TRANSPARENT,
            faces: Face::ALL.to_vec(),
            watermark: None,
            preview: PreviewConfig::default(),
            write_faces: false,
            decode_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            tile_path: TilePathTemplate::default(),
        }
    }
}

impl ConvertConfig {
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_face_edge(mut self, edge: u32) -> Self {
        self.face_edge = Some(edge);
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_background(mut self, background: Pixel) -> Self {
        self.background = background;
        self
    }

    pub fn with_faces(mut self, faces: impl Into<Vec<Face>>) -> Self {
        self.faces = faces.into();
        self
    }

    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = Some(watermark);
        self
    }

    /// Write a horizontal-cross preview `4·⌊width/4⌋` wide and three
    /// quarters as tall.
    pub fn with_cross_preview(mut self, width: u32) -> Self {
        self.preview.cross_width = Some(width);
        self
    }

    pub fn with_equirect_preview(mut self, max_dimension: u32) -> Self {
        self.preview.equirect_max = Some(max_dimension);
        self
    }

    pub fn with_face_images(mut self, write: bool) -> Self {
        self.write_faces = write;
        self
    }

    pub fn with_decode_threads(mut self, threads: usize) -> Self {
        self.decode_threads = threads;
        self
    }

    pub fn with_tile_path(mut self, template: TilePathTemplate) -> Self {
        self.tile_path = template;
        self
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        if !(self.angle > 0.0 && self.angle <= 360.0) {
            return Err(ConfigError::InvalidAngle(self.angle));
        }
        if !(-90.0..=90.0).contains(&self.pitch) {
            return Err(ConfigError::InvalidPitch(self.pitch));
        }
        if let OutputFormat::Jpeg { quality } = self.format {
            if quality > 100 {
                return Err(ConfigError::InvalidQuality(quality));
            }
        }
        if self.face_edge == Some(0) {
            return Err(ConfigError::InvalidFaceEdge);
        }
        if self.faces.is_empty() {
            return Err(ConfigError::NoFaces);
        }
        if let Some(width) = self.preview.cross_width {
            if width < 4 {
                return Err(ConfigError::InvalidPreviewWidth(width));
            }
        }
        if let Some(max) = self.preview.equirect_max {
            if max == 0 {
                return Err(ConfigError::InvalidPreviewWidth(max));
            }
        }
        if let Some(watermark) = &self.watermark {
            if !(watermark.scale > 0.0 && watermark.scale <= 1.0) {
                return Err(ConfigError::InvalidWatermarkScale(watermark.scale));
            }
        }
        Ok(())
    }
}
