//! Error types for layered document decoding.

use std::io;

use thiserror::Error;

/// The document bytes do not describe something this decoder can read.
///
/// All variants are fatal: the document load is aborted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The file does not start with `8BPS`.
    #[error("Invalid signature {0:?}, expected \"8BPS\"")]
    InvalidSignature([u8; 4]),

    /// Version is neither 1 (PSD) nor 2 (PSB).
    #[error("Unsupported version {0} (expected 1 for PSD or 2 for PSB)")]
    UnsupportedVersion(u16),

    /// Compression flag is neither 0 (raw) nor 1 (run-length).
    #[error("Unsupported compression method {0}")]
    UnsupportedCompression(u16),

    /// Only 8 bits per channel are supported.
    #[error("Unsupported bit depth {0} (only 8-bit channels are supported)")]
    UnsupportedDepth(u16),

    /// Fewer than the three channel groups needed for RGB assembly.
    #[error("Unsupported channel count {0} (at least 3 channels required)")]
    UnsupportedChannels(u16),

    /// A decompressed scanline does not match the document width.
    #[error("Scanline {index} decoded to {actual} bytes, expected {expected}")]
    ScanlineLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// The compressed bytes end in the middle of a run.
    #[error("Scanline {index} ends inside a run")]
    TruncatedRun { index: usize },

    /// A section claims more bytes than the file holds or can address.
    #[error("Section length {0} exceeds the file size")]
    SectionTooLarge(u64),

    /// The header describes more scanlines than can be held in memory.
    #[error("Document needs {0} scanlines, more than can be allocated")]
    TooManyScanlines(usize),
}

/// Errors that can occur while loading a layered document.
#[derive(Debug, Error)]
pub enum PsdError {
    /// I/O error from the filesystem boundary, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document is malformed or uses an unsupported feature.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// The decode worker pool could not be built or lost a worker.
    #[error("Decode worker pool failed: {0}")]
    WorkerPool(String),
}

impl PsdError {
    /// Returns the format error if this is one.
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            PsdError::Format(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display_signature() {
        let err = FormatError::InvalidSignature(*b"GIF8");
        assert_eq!(
            err.to_string(),
            "Invalid signature [71, 73, 70, 56], expected \"8BPS\""
        );
    }

    #[test]
    fn test_format_error_display_scanline_length() {
        let err = FormatError::ScanlineLength {
            index: 7,
            expected: 16,
            actual: 15,
        };
        assert_eq!(err.to_string(), "Scanline 7 decoded to 15 bytes, expected 16");
    }

    #[test]
    fn test_psd_error_from_format_error() {
        let err: PsdError = FormatError::UnsupportedVersion(3).into();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnsupportedVersion(3))
        ));
        assert!(err.to_string().contains("Unsupported version 3"));
    }

    #[test]
    fn test_psd_error_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.psb");
        let err: PsdError = io_err.into();
        assert!(matches!(err, PsdError::Io(_)));
        assert!(err.as_format().is_none());
    }
}
