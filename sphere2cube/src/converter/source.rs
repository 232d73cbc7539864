//! Opening source panoramas of any supported kind.

use std::path::Path;

use tracing::debug;

use super::ConvertError;
use crate::pixel::{Pixel, PixelSource};
use crate::psd::{DecodeOptions, PsdDocument, PsdLayout};
use crate::raster::{RasterError, RasterImage};

/// A loaded source panorama.
#[derive(Debug)]
pub enum SourceImage {
    /// Decoded `.psd` / `.psb` document.
    Document(PsdDocument),
    /// Any conventional raster format.
    Raster(RasterImage),
}

impl SourceImage {
    /// Open `path`, dispatching on its extension.
    ///
    /// `.psd` and `.psb` go through the document decoder; everything else is
    /// handed to the raster loader, which rejects extensions it does not
    /// recognise.
    pub fn open(path: &Path, options: &DecodeOptions) -> Result<Self, ConvertError> {
        if is_document(path) {
            debug!(path = %path.display(), threads = options.threads, "Opening layered document");
            Ok(SourceImage::Document(PsdDocument::open_with(path, options)?))
        } else {
            debug!(path = %path.display(), "Opening raster image");
            Ok(SourceImage::Raster(RasterImage::load(path)?))
        }
    }

    /// Dimensions of the image at `path` without decoding its pixels.
    pub fn dimensions(path: &Path) -> Result<(u32, u32), ConvertError> {
        if is_document(path) {
            let layout = PsdLayout::open(path)?;
            Ok((layout.header.width, layout.header.height))
        } else {
            image::ImageFormat::from_path(path).map_err(|_| {
                RasterError::UnsupportedImageType(path.display().to_string())
            })?;
            Ok(image::image_dimensions(path).map_err(RasterError::from)?)
        }
    }

    /// Set the pixel returned outside the image.
    pub fn with_background(self, background: Pixel) -> Self {
        match self {
            SourceImage::Document(doc) => SourceImage::Document(doc.with_background(background)),
            SourceImage::Raster(img) => SourceImage::Raster(img.with_background(background)),
        }
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("psd") || e.eq_ignore_ascii_case("psb"))
        .unwrap_or(false)
}

impl PixelSource for SourceImage {
    fn width(&self) -> u32 {
        match self {
            SourceImage::Document(doc) => doc.width(),
            SourceImage::Raster(img) => img.width(),
        }
    }

    fn height(&self) -> u32 {
        match self {
            SourceImage::Document(doc) => doc.height(),
            SourceImage::Raster(img) => img.height(),
        }
    }

    #[inline]
    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        match self {
            SourceImage::Document(doc) => doc.get_pixel(x, y),
            SourceImage::Raster(img) => img.get_pixel(x, y),
        }
    }

    fn background(&self) -> Pixel {
        match self {
            SourceImage::Document(doc) => doc.background(),
            SourceImage::Raster(img) => img.background(),
        }
    }
}
