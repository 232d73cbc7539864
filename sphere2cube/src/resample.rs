//! Bilinear resampling primitives.
//!
//! Scaling works purely through pixel accessor closures, so the same code scales
//! raster images, decoded documents, or anything else that can answer
//! "what is the pixel at (x, y)".

use crate::pixel::Pixel;
use crate::progress::{Progress, Stage};

/// Width and height of a pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size scaled by `factor`, each axis rounded to nearest.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
        }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The larger of the two dimensions.
    pub fn max_dimension(self) -> u32 {
        self.width.max(self.height)
    }
}

/// Bilinear resampling from a `src`-sized grid into a `dst`-sized grid.
///
/// Target pixel `(j, i)` samples the source at `x = j·srcW/dstW`,
/// `y = i·srcH/dstH` and blends the four surrounding pixels by their
/// fractional offsets. On an axis where the sample lands exactly on a pixel
/// (or on the last column/row) no blending happens along that axis, so
/// scaling to the same size is an exact copy.
///
/// Reports one progress tick per target row under [`Stage::Downscale`].
pub fn scale<G, S>(src: Size, dst: Size, get: G, mut set: S, progress: &Progress)
where
    G: Fn(u32, u32) -> Pixel,
    S: FnMut(u32, u32, Pixel),
{
    if src.is_empty() || dst.is_empty() {
        return;
    }

    let rows = dst.height as u64;
    progress.begin(Stage::Downscale, rows);

    for i in 0..dst.height {
        let y = (i as f64 * src.height as f64) / dst.height as f64;
        let y_min = y.floor() as u32;
        let y_max = (y.ceil() as u32).min(src.height - 1);

        for j in 0..dst.width {
            let x = (j as f64 * src.width as f64) / dst.width as f64;
            let x_min = x.floor() as u32;
            let x_max = (x.ceil() as u32).min(src.width - 1);

            let top = lerp_row(x, x_min, x_max, y_min, &get);
            let value = if y_max == y_min {
                top
            } else {
                let bottom = lerp_row(x, x_min, x_max, y_max, &get);
                lerp(y, y_min, y_max, top, bottom)
            };

            set(j, i, to_pixel(value));
        }
        progress.update(Stage::Downscale, rows, i as u64 + 1);
    }
}

fn lerp_row<G>(x: f64, x_min: u32, x_max: u32, y: u32, get: &G) -> [f64; 4]
where
    G: Fn(u32, u32) -> Pixel,
{
    let left = to_f64(get(x_min, y));
    if x_max == x_min {
        return left;
    }
    let right = to_f64(get(x_max, y));
    lerp(x, x_min, x_max, left, right)
}

/// Linear blend between values at adjacent integer positions `k_min` and
/// `k_max` (callers guarantee `k_max == k_min + 1`).
#[inline]
fn lerp(k: f64, k_min: u32, k_max: u32, v_min: [f64; 4], v_max: [f64; 4]) -> [f64; 4] {
    let t = k - k_min as f64;
    let s = k_max as f64 - k;
    [
        t * v_max[0] + s * v_min[0],
        t * v_max[1] + s * v_min[1],
        t * v_max[2] + s * v_min[2],
        t * v_max[3] + s * v_min[3],
    ]
}

#[inline]
fn to_f64(p: Pixel) -> [f64; 4] {
    [p.r as f64, p.g as f64, p.b as f64, p.a as f64]
}

#[inline]
fn to_pixel(v: [f64; 4]) -> Pixel {
    let c = |x: f64| x.round().clamp(0.0, 255.0) as u8;
    Pixel::rgba(c(v[0]), c(v[1]), c(v[2]), c(v[3]))
}
