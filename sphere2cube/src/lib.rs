//! sphere2cube - Equirectangular panoramas to cube tile pyramids
//!
//! This library converts full-sphere (or partial) panoramas, read from
//! layered PSD/PSB documents or conventional image files, into six cube
//! faces sliced into multi-resolution tile pyramids for panorama viewers.
//!
//! # High-Level API
//!
//! The [`converter`] module runs the whole pipeline:
//!
//! ```no_run
//! use std::path::Path;
//! use sphere2cube::config::{ConvertConfig, OutputFormat};
//! use sphere2cube::converter::Converter;
//!
//! let config = ConvertConfig::default()
//!     .with_tile_size(512)
//!     .with_format(OutputFormat::jpeg());
//! let summary = Converter::new(config)?.convert(Path::new("pano.psb"), Path::new("tiles"))?;
//! println!("{} tiles, max level {}", summary.tiles_written, summary.max_level);
//! # Ok::<(), sphere2cube::converter::ConvertError>(())
//! ```
//!
//! The building blocks ([`psd`], [`raster`], [`resample`], [`projection`],
//! [`pyramid`]) are public for callers that need only part of it.

pub mod config;
pub mod converter;
pub mod logging;
pub mod pixel;
pub mod progress;
pub mod projection;
pub mod psd;
pub mod pyramid;
pub mod raster;
pub mod resample;

pub use pixel::{Pixel, PixelSource};
pub use progress::{Progress, ProgressCallback, ProgressEvent, Stage};

/// Version of the library and CLI, taken from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
