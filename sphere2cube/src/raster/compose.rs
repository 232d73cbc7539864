//! Alpha compositing of one raster onto another.

use super::RasterImage;
use crate::pixel::{Pixel, PixelSource};

/// Which layer the composited image becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// The new image is drawn over the existing pixels.
    #[default]
    Above,
    /// The new image is drawn underneath; it only shows through where the
    /// existing pixels are not opaque.
    Below,
}

impl RasterImage {
    /// Composite `layer` with its top-left corner at `(x, y)`.
    ///
    /// Only the overlapping region changes. Blending is the standard
    /// "over" operator on unmultiplied alpha, applied per channel.
    pub fn compose<S: PixelSource + ?Sized>(&mut self, layer: &S, x: i64, y: i64, placement: Placement) {
        for ly in 0..layer.height() as i64 {
            let ty = y + ly;
            if ty < 0 || ty >= self.height() as i64 {
                continue;
            }
            for lx in 0..layer.width() as i64 {
                let tx = x + lx;
                if tx < 0 || tx >= self.width() as i64 {
                    continue;
                }
                let existing = self.get_pixel(tx, ty);
                let incoming = layer.get_pixel(lx, ly);
                let blended = match placement {
                    Placement::Above => over(incoming, existing),
                    Placement::Below => over(existing, incoming),
                };
                self.set_pixel(tx, ty, blended);
            }
        }
    }
}

/// `top` over `bottom`, both with unmultiplied alpha.
fn over(top: Pixel, bottom: Pixel) -> Pixel {
    let at = top.a as f64 / 255.0;
    let ab = bottom.a as f64 / 255.0;
    let ao = at + ab * (1.0 - at);
    if ao <= 0.0 {
        return Pixel::TRANSPARENT;
    }
    let channel = |t: u8, b: u8| {
        let c = (t as f64 * at + b as f64 * ab * (1.0 - at)) / ao;
        c.round().clamp(0.0, 255.0) as u8
    };
    Pixel::rgba(
        channel(top.r, bottom.r),
        channel(top.g, bottom.g),
        channel(top.b, bottom.b),
        (ao * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}
