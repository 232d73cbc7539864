//! Progress reporting for long-running stages.
//!
//! The core never prints. Every long-running stage (scanline decode, face
//! projection, tile writing, downscaling) reports `(total, completed)` ticks
//! through an injected callback, and the presentation layer decides what to
//! do with them.

use std::fmt;
use std::sync::Arc;

use crate::projection::Face;

/// Which stage a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading and decompressing source scanlines.
    Decode,
    /// Rendering the horizontal-cross preview.
    Preview,
    /// Downscaling the source into an equirectangular preview.
    EquirectPreview,
    /// Projecting one cube face at full resolution.
    Face(Face),
    /// Writing the tiles of one pyramid level (level 0 is the coarsest).
    Tiles { face: Face, level: u32 },
    /// Generic bilinear downscale pass.
    Downscale,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Decode => write!(f, "Decode"),
            Stage::Preview => write!(f, "Preview"),
            Stage::EquirectPreview => write!(f, "Equirectangular preview"),
            Stage::Face(face) => write!(f, "Face {}", face.name()),
            Stage::Tiles { face, level } => write!(f, "Tiles {} level {}", face.name(), level),
            Stage::Downscale => write!(f, "Downscale"),
        }
    }
}

/// A single progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Total units of work in this stage.
    pub total: u64,
    /// Units completed so far (`completed == total` marks the end).
    pub completed: u64,
}

/// Progress callback invoked for each tick.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cloneable handle used by core components to report progress.
///
/// A handle created with [`Progress::none`] discards all ticks.
#[derive(Clone, Default)]
pub struct Progress {
    callback: Option<ProgressCallback>,
}

impl Progress {
    /// Handle that discards all progress.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Handle forwarding every tick to `callback`.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Convenience constructor from a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        Self::new(Arc::new(f))
    }

    /// Returns true if ticks go anywhere.
    pub fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    /// Report the start of a stage.
    pub fn begin(&self, stage: Stage, total: u64) {
        self.update(stage, total, 0);
    }

    /// Report `completed` of `total` units done.
    pub fn update(&self, stage: Stage, total: u64, completed: u64) {
        if let Some(cb) = &self.callback {
            cb(ProgressEvent {
                stage,
                total,
                completed,
            });
        }
    }

    /// Report the end of a stage.
    pub fn finish(&self, stage: Stage, total: u64) {
        self.update(stage, total, total);
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
