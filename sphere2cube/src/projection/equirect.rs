//! Equirectangular view of a partial or full-sphere source.
//!
//! A source covering less than 360° is centred inside a larger virtual
//! "outer" equirectangular frame. Lookups are then made against the outer
//! frame; anything outside the embedded source reads as the source's
//! background.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::debug;

use crate::pixel::{Pixel, PixelSource};

/// A source embedded in a full 360°×180° equirectangular frame.
#[derive(Debug, Clone)]
pub struct Equirect<S> {
    source: S,
    outer_width: u32,
    outer_height: u32,
    x_offset: i64,
    y_offset: i64,
}

impl<S: PixelSource> Equirect<S> {
    /// Embed `source`, which spans `angle` degrees horizontally, shifted
    /// toward the zenith by `pitch` degrees.
    pub fn new(source: S, angle: f64, pitch: f64) -> Self {
        let width = source.width() as f64;
        let height = source.height() as f64;
        let outer_width = (width * 360.0 / angle).round() as u32;
        let outer_height = outer_width / 2;
        let x_offset = ((outer_width as f64 - width) / 2.0).floor() as i64;
        let y_offset = ((outer_height as f64 - height) / 2.0).floor() as i64
            - (pitch * outer_height as f64 / 180.0).round() as i64;

        debug!(
            outer_width,
            outer_height,
            x_offset,
            y_offset,
            angle,
            pitch,
            "Embedded source"
        );

        Self {
            source,
            outer_width,
            outer_height,
            x_offset,
            y_offset,
        }
    }

    /// Full-sphere view of `source` with no pitch shift.
    pub fn full_sphere(source: S) -> Self {
        Self::new(source, 360.0, 0.0)
    }

    pub fn outer_width(&self) -> u32 {
        self.outer_width
    }

    pub fn outer_height(&self) -> u32 {
        self.outer_height
    }

    /// Position of the source's top-left corner in the outer frame.
    pub fn offsets(&self) -> (i64, i64) {
        (self.x_offset, self.y_offset)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Face edge used when none is configured: a quarter of the source
    /// width, whatever its angular coverage.
    pub fn default_face_edge(&self) -> u32 {
        self.source.width() / 4
    }

    /// Colour seen looking along `direction`.
    ///
    /// The direction is converted to longitude/latitude, mapped onto the
    /// outer frame, and sampled bilinearly. Horizontal lookups wrap around
    /// the frame; vertical ones clamp at the poles.
    pub fn sample_direction(&self, direction: [f64; 3]) -> Pixel {
        let [x, y, z] = direction;
        let theta = y.atan2(x);
        let phi = z.atan2(x.hypot(y));

        let edge = self.outer_width as f64 / 4.0;
        let u = 2.0 * edge * (theta + PI) / PI;
        let v = 2.0 * edge * (FRAC_PI_2 - phi) / PI;
        self.sample(u, v)
    }

    /// Bilinear sample at continuous outer-frame coordinates.
    pub fn sample(&self, u: f64, v: f64) -> Pixel {
        if self.outer_width == 0 || self.outer_height == 0 {
            return self.source.background();
        }
        let w = self.outer_width as i64;
        let max_v = self.outer_height as i64 - 1;

        let u0 = u.floor();
        let v0 = v.floor();
        let fu = u - u0;
        let fv = v - v0;

        let x0 = (u0 as i64).rem_euclid(w);
        let x1 = (x0 + 1).rem_euclid(w);
        let y0 = (v0 as i64).clamp(0, max_v);
        let y1 = (v0 as i64 + 1).clamp(0, max_v);

        let p00 = self.get_pixel(x0, y0).channels();
        let p10 = self.get_pixel(x1, y0).channels();
        let p01 = self.get_pixel(x0, y1).channels();
        let p11 = self.get_pixel(x1, y1).channels();

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = p00[c] as f64 * (1.0 - fu) + p10[c] as f64 * fu;
            let bottom = p01[c] as f64 * (1.0 - fu) + p11[c] as f64 * fu;
            out[c] = (top * (1.0 - fv) + bottom * fv).round().clamp(0.0, 255.0) as u8;
        }
        Pixel::from_channels(out)
    }
}

impl<S: PixelSource> PixelSource for Equirect<S> {
    fn width(&self) -> u32 {
        self.outer_width
    }

    fn height(&self) -> u32 {
        self.outer_height
    }

    /// Pixel of the outer frame; outside the embedded source this is the
    /// source background.
    #[inline]
    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        if !self.contains(x, y) {
            return self.source.background();
        }
        self.source.get_pixel(x - self.x_offset, y - self.y_offset)
    }

    fn background(&self) -> Pixel {
        self.source.background()
    }
}
