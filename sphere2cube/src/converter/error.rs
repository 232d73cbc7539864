//! Errors surfaced by a conversion run.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::psd::PsdError;
use crate::raster::RasterError;

/// Any failure during [`Converter::convert`](super::Converter::convert).
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Configuration rejected before any work started.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The layered document could not be decoded.
    #[error(transparent)]
    Document(#[from] PsdError),

    /// Loading, encoding or writing an image failed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Filesystem error outside image encoding.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source has no pixels to project.
    #[error("Source image is empty ({width}×{height})")]
    EmptySource { width: u32, height: u32 },
}

impl ConvertError {
    /// Returns true if the input file itself is malformed or unsupported,
    /// as opposed to an environment or configuration problem.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            ConvertError::Document(PsdError::Format(_))
                | ConvertError::Raster(RasterError::UnsupportedImageType(_))
                | ConvertError::Raster(RasterError::Image(_))
                | ConvertError::EmptySource { .. }
        )
    }
}
