//! Pixel value and the `PixelSource` read capability.
//!
//! Every image-like thing in the pipeline (decoded PSD documents, raster
//! images, the embedded equirectangular view) exposes the same total
//! read interface: any coordinate can be queried, and coordinates outside
//! the image return the source's background pixel instead of failing.

use image::Rgba;

/// An 8-bit RGBA pixel (unmultiplied alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Fully transparent black, the default background.
    pub const TRANSPARENT: Pixel = Pixel::rgba(0, 0, 0, 0);

    /// Opaque black.
    pub const BLACK: Pixel = Pixel::rgba(0, 0, 0, 255);

    /// Opaque white.
    pub const WHITE: Pixel = Pixel::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque pixel from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Channels in RGBA order.
    #[inline]
    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn from_channels(c: [u8; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba<u8>> for Pixel {
    fn from(p: Rgba<u8>) -> Self {
        Pixel::from_channels(p.0)
    }
}

impl From<Pixel> for Rgba<u8> {
    fn from(p: Pixel) -> Self {
        Rgba(p.channels())
    }
}

/// Read access to a 2D grid of pixels.
///
/// `get_pixel` is total: for coordinates outside `0..width` × `0..height`
/// implementations return their configured background pixel. Coordinates
/// are signed because the projection engine shifts lookups by embedding
/// offsets that can move them below zero.
pub trait PixelSource {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Pixel at `(x, y)`, or the background when out of range.
    fn get_pixel(&self, x: i64, y: i64) -> Pixel;

    /// Pixel returned for out-of-range lookups.
    fn background(&self) -> Pixel;

    /// Returns true when `(x, y)` addresses a real pixel.
    #[inline]
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }
}

impl<S: PixelSource + ?Sized> PixelSource for &S {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        (**self).get_pixel(x, y)
    }

    fn background(&self) -> Pixel {
        (**self).background()
    }
}

impl<S: PixelSource + ?Sized> PixelSource for Box<S> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        (**self).get_pixel(x, y)
    }

    fn background(&self) -> Pixel {
        (**self).background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Checker {
        background: Pixel,
    }

    impl PixelSource for Checker {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn get_pixel(&self, x: i64, y: i64) -> Pixel {
            if !self.contains(x, y) {
                return self.background;
            }
            if (x + y) % 2 == 0 {
                Pixel::BLACK
            } else {
                Pixel::WHITE
            }
        }

        fn background(&self) -> Pixel {
            self.background
        }
    }

    #[test]
    fn test_pixel_rgba_conversion() {
        let p = Pixel::rgba(1, 2, 3, 4);
        let rgba: Rgba<u8> = p.into();
        assert_eq!(rgba.0, [1, 2, 3, 4]);
        assert_eq!(Pixel::from(rgba), p);
    }

    #[test]
    fn test_default_is_transparent() {
        assert_eq!(Pixel::default(), Pixel::TRANSPARENT);
    }

    #[test]
    fn test_contains() {
        let src = Checker {
            background: Pixel::TRANSPARENT,
        };
        assert!(src.contains(0, 0));
        assert!(src.contains(1, 1));
        assert!(!src.contains(-1, 0));
        assert!(!src.contains(2, 0));
        assert!(!src.contains(0, 2));
    }

    #[test]
    fn test_reference_and_box_forward() {
        let src = Checker {
            background: Pixel::rgb(9, 9, 9),
        };
        let by_ref: &dyn PixelSource = &src;
        assert_eq!(by_ref.get_pixel(1, 0), Pixel::WHITE);

        let boxed: Box<dyn PixelSource> = Box::new(src);
        assert_eq!(boxed.get_pixel(5, 5), Pixel::rgb(9, 9, 9));
        assert_eq!(boxed.width(), 2);
    }
}
