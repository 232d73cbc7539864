//! Decoder for layered binary image documents (PSD and PSB).
//!
//! Only the merged (flattened) image data is read; layers, masks and image
//! resources are skipped. Both on-disk variants are supported:
//!
//! | version | variant | layer section length | scanline length table |
//! |---------|---------|----------------------|-----------------------|
//! | 1       | PSD     | u32                  | u16 per line          |
//! | 2       | PSB     | u64                  | u32 per line          |
//!
//! # Example
//!
//! ```no_run
//! use sphere2cube::psd::{DecodeOptions, PsdDocument, PsdLayout};
//! use sphere2cube::PixelSource;
//!
//! // Dimensions only, no decompression
//! let layout = PsdLayout::open("pano.psb")?;
//! println!("{}×{}", layout.header.width, layout.header.height);
//!
//! // Full decode on 8 workers
//! let doc = PsdDocument::open_with("pano.psb", &DecodeOptions::default().with_threads(8))?;
//! let centre = doc.get_pixel(doc.width() as i64 / 2, doc.height() as i64 / 2);
//! # let _ = centre;
//! # Ok::<(), sphere2cube::psd::PsdError>(())
//! ```

mod decoder;
mod document;
mod error;
mod header;
mod packbits;

pub use decoder::{ScanlineDecoder, ScanlineTask};
pub use document::{DecodeOptions, PsdDocument};
pub use error::{FormatError, PsdError};
pub use header::{Compression, PsdHeader, PsdLayout, PsdVersion, HEADER_LEN, SIGNATURE};
pub use packbits::{decode_packbits, decode_scanline};
