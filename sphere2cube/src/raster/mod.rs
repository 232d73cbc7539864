//! In-memory RGBA raster images.
//!
//! [`RasterImage`] is the pixel buffer every stage after decoding works on:
//! face renders, previews, pyramid levels and tiles. Storage is chosen at
//! construction from the requested size (one contiguous buffer, or one
//! buffer per row for very large images) and is not visible to callers.

mod codec;
mod compose;
mod error;
mod storage;

pub use codec::RasterFormat;
pub use compose::Placement;
pub use error::RasterError;
pub use storage::DEFAULT_FLAT_LIMIT;

use image::RgbaImage;
use tracing::debug;

use crate::pixel::{Pixel, PixelSource};
use crate::progress::Progress;
use crate::resample::{self, Size};
use storage::{Storage, BYTES_PER_PIXEL};

/// An owned RGBA8 image with total pixel access.
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    storage: Storage,
    background: Pixel,
    flat_limit: usize,
}

impl RasterImage {
    /// Create a transparent `width` × `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_flat_limit(width, height, DEFAULT_FLAT_LIMIT)
    }

    /// Create an image that switches to per-row storage once its byte size
    /// exceeds `flat_limit`. Images derived from this one (crops, rescales)
    /// inherit the limit.
    pub fn with_flat_limit(width: u32, height: u32, flat_limit: usize) -> Self {
        let storage = Storage::allocate(width, height, flat_limit);
        if !storage.is_flat() {
            debug!(width, height, "Using per-row raster storage");
        }
        Self {
            width,
            height,
            storage,
            background: Pixel::TRANSPARENT,
            flat_limit,
        }
    }

    /// Copy every pixel of `source` into a new image with the same
    /// dimensions and background.
    pub fn from_source<S: PixelSource + ?Sized>(source: &S) -> Self {
        let mut image = Self::new(source.width(), source.height());
        image.background = source.background();
        for y in 0..image.height {
            let row = image.storage.row_mut(y as usize);
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                px.copy_from_slice(&source.get_pixel(x as i64, y as i64).channels());
            }
        }
        image
    }

    /// Take ownership of a decoded `image` crate buffer.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut raster = Self::new(width, height);
        match &mut raster.storage {
            Storage::Flat { data, .. } => *data = image.into_raw(),
            Storage::Rows(rows) => {
                let stride = width as usize * BYTES_PER_PIXEL;
                for (row, chunk) in rows.iter_mut().zip(image.as_raw().chunks_exact(stride)) {
                    row.copy_from_slice(chunk);
                }
            }
        }
        raster
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Set the pixel returned for out-of-range reads.
    pub fn with_background(mut self, background: Pixel) -> Self {
        self.background = background;
        self
    }

    pub fn set_background(&mut self, background: Pixel) {
        self.background = background;
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Pixel) {
        self.storage.fill(color.channels());
    }

    /// Write one pixel. Out-of-range writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: i64, y: i64, pixel: Pixel) {
        if !self.contains(x, y) {
            return;
        }
        let offset = x as usize * BYTES_PER_PIXEL;
        self.storage.row_mut(y as usize)[offset..offset + BYTES_PER_PIXEL]
            .copy_from_slice(&pixel.channels());
    }

    /// Copy the `width` × `height` region at `(x, y)` into a new image.
    ///
    /// Parts of the region outside this image are filled with the
    /// background.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> RasterImage {
        let mut out = Self::with_flat_limit(width, height, self.flat_limit);
        out.background = self.background;

        let copy_w = width.min(self.width.saturating_sub(x));
        let copy_h = height.min(self.height.saturating_sub(y));
        if copy_w < width || copy_h < height {
            out.fill(self.background);
        }

        if copy_w == 0 {
            return out;
        }
        let start = x as usize * BYTES_PER_PIXEL;
        let len = copy_w as usize * BYTES_PER_PIXEL;
        for row in 0..copy_h {
            let src = &self.storage.row((y + row) as usize)[start..start + len];
            out.storage.row_mut(row as usize)[..len].copy_from_slice(src);
        }
        out
    }

    /// Bilinear rescale to `round(w·factor)` × `round(h·factor)`.
    pub fn scale_by_factor(&self, factor: f64) -> RasterImage {
        self.scale_by_factor_with_progress(factor, &Progress::none())
    }

    /// [`scale_by_factor`](Self::scale_by_factor) reporting per-row progress.
    pub fn scale_by_factor_with_progress(&self, factor: f64, progress: &Progress) -> RasterImage {
        self.scale_to(self.size().scaled(factor), progress)
    }

    /// Bilinear rescale to an explicit size.
    pub fn scale_to(&self, size: Size, progress: &Progress) -> RasterImage {
        let mut out = Self::with_flat_limit(size.width, size.height, self.flat_limit);
        out.background = self.background;
        resample::scale(
            self.size(),
            size,
            |x, y| self.pixel_at(x, y),
            |x, y, p| out.set_pixel(x as i64, y as i64, p),
            progress,
        );
        out
    }

    /// Iteratively downscale `source` until its larger dimension is at most
    /// `max_dimension`.
    ///
    /// Each pass shrinks by `max(0.5, max_dimension / current)`, so large
    /// reductions go through successive halvings instead of one coarse
    /// bilinear pass. A source that already fits is copied unchanged.
    pub fn downscale_to_fit<S: PixelSource + ?Sized>(
        source: &S,
        max_dimension: u32,
        progress: &Progress,
    ) -> Result<RasterImage, RasterError> {
        if max_dimension == 0 {
            return Err(RasterError::InvalidDimensions {
                width: source.width(),
                height: source.height(),
                reason: "cannot fit into a zero-sized box".to_string(),
            });
        }

        let src_size = Size::new(source.width(), source.height());
        if src_size.max_dimension() <= max_dimension || src_size.is_empty() {
            return Ok(Self::from_source(source));
        }

        // First pass reads the source directly, so it is never copied whole
        let first = src_size.scaled(step_factor(src_size, max_dimension));
        let mut current = Self::new(first.width, first.height).with_background(source.background());
        resample::scale(
            src_size,
            first,
            |x, y| source.get_pixel(x as i64, y as i64),
            |x, y, p| current.set_pixel(x as i64, y as i64, p),
            progress,
        );

        while current.size().max_dimension() > max_dimension {
            let factor = step_factor(current.size(), max_dimension);
            current = current.scale_by_factor_with_progress(factor, progress);
        }

        debug!(
            from_width = src_size.width,
            from_height = src_size.height,
            width = current.width,
            height = current.height,
            "Downscaled to fit"
        );
        Ok(current)
    }

    /// Copy into a contiguous `image` crate buffer.
    ///
    /// Fails for images whose byte size exceeds the flat-storage limit.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, RasterError> {
        if self.byte_len() > self.flat_limit {
            return Err(RasterError::InvalidDimensions {
                width: self.width,
                height: self.height,
                reason: format!("{} bytes exceed the contiguous buffer limit", self.byte_len()),
            });
        }
        let mut data = Vec::with_capacity(self.byte_len());
        for y in 0..self.height as usize {
            data.extend_from_slice(self.storage.row(y));
        }
        RgbaImage::from_raw(self.width, self.height, data).ok_or_else(|| {
            RasterError::InvalidDimensions {
                width: self.width,
                height: self.height,
                reason: "pixel buffer does not match dimensions".to_string(),
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn is_row_backed(&self) -> bool {
        !self.storage.is_flat()
    }

    fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// In-range pixel read without the bounds check on signed coordinates.
    #[inline]
    fn pixel_at(&self, x: u32, y: u32) -> Pixel {
        let offset = x as usize * BYTES_PER_PIXEL;
        let row = self.storage.row(y as usize);
        Pixel::rgba(row[offset], row[offset + 1], row[offset + 2], row[offset + 3])
    }
}

/// Images compare equal when they have the same dimensions and pixels;
/// backing storage and background are ignored.
impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (0..self.height as usize).all(|y| self.storage.row(y) == other.storage.row(y))
    }
}

impl Eq for RasterImage {}

impl PixelSource for RasterImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        if !self.contains(x, y) {
            return self.background;
        }
        self.pixel_at(x as u32, y as u32)
    }

    fn background(&self) -> Pixel {
        self.background
    }
}

fn step_factor(size: Size, max_dimension: u32) -> f64 {
    (max_dimension as f64 / size.max_dimension() as f64).max(0.5)
}
