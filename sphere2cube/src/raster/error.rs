//! Error types for raster image operations.

use std::io;

use thiserror::Error;

/// Errors that can occur while loading, encoding, or writing raster images.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The file extension does not map to a supported image format.
    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// I/O error from the filesystem boundary, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding failed inside the image codec.
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Streaming PNG encoding failed.
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    /// The image cannot be represented in the requested form.
    #[error("Invalid dimensions {width}×{height}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },
}
