//! Spherical projection from equirectangular sources to cube faces.
//!
//! Every output pixel is turned into a 3D direction by its face's mapping,
//! the direction into longitude/latitude, and that into a bilinear sample
//! of the (possibly partial) source embedded in a full-sphere frame.
//!
//! ```text
//!                ┌──────┐
//!                │ Top  │
//!  ┌──────┬──────┼──────┼──────┐
//!  │ Back │ Left │Front │Right │
//!  └──────┴──────┼──────┼──────┘
//!                │Bottom│
//!                └──────┘
//! ```
//!
//! The preview cross above and the full-resolution faces share the same
//! per-face sampling, so both show each face in the same orientation.

mod equirect;
mod face;
mod renderer;

pub use equirect::Equirect;
pub use face::{Face, ParseFaceError};
pub use renderer::Projector;
