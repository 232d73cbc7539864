//! Encoding raster images to disk and loading conventional image files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader};
use tracing::debug;

use super::storage::BYTES_PER_PIXEL;
use super::{RasterError, RasterImage};

/// Output encodings supported by [`RasterImage::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Lossless, keeps the alpha channel.
    Png,
    /// Lossy, alpha is dropped.
    Jpeg,
}

impl RasterFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self, RasterError> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(RasterFormat::Png),
            "jpg" | "jpeg" => Ok(RasterFormat::Jpeg),
            _ => Err(RasterError::UnsupportedImageType(ext.to_string())),
        }
    }

    /// Pick the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, RasterError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| RasterError::UnsupportedImageType(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }
}

impl RasterImage {
    /// Write the image to `path`, choosing the encoding from its extension.
    ///
    /// `quality` (0–100) only applies to JPEG output.
    pub fn write(&self, path: impl AsRef<Path>, quality: u8) -> Result<(), RasterError> {
        let path = path.as_ref();
        let format = RasterFormat::from_path(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        self.encode(&mut writer, format, quality)?;
        writer.flush()?;
        debug!(path = %path.display(), width = self.width, height = self.height, "Image written");
        Ok(())
    }

    /// Encode the image into `writer`.
    ///
    /// PNG output is streamed one row at a time, so it works for images of
    /// any size. JPEG needs the whole image as one RGB buffer; images whose
    /// buffer would exceed the flat-storage limit are rejected.
    pub fn encode<W: Write>(&self, writer: W, format: RasterFormat, quality: u8) -> Result<(), RasterError> {
        match format {
            RasterFormat::Png => self.encode_png(writer)?,
            RasterFormat::Jpeg => {
                let len = self.width as usize * self.height as usize * 3;
                if len > self.flat_limit {
                    return Err(RasterError::InvalidDimensions {
                        width: self.width,
                        height: self.height,
                        reason: format!(
                            "JPEG encoding needs a {} byte buffer, over the {} byte limit",
                            len, self.flat_limit
                        ),
                    });
                }
                let mut data = Vec::with_capacity(len);
                for y in 0..self.height as usize {
                    for px in self.storage.row(y).chunks_exact(BYTES_PER_PIXEL) {
                        data.extend_from_slice(&px[..3]);
                    }
                }
                JpegEncoder::new_with_quality(writer, quality.clamp(1, 100)).write_image(
                    &data,
                    self.width,
                    self.height,
                    ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(())
    }

    fn encode_png<W: Write>(&self, writer: W) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        let mut stream = writer.stream_writer()?;
        for y in 0..self.height as usize {
            stream.write_all(self.storage.row(y))?;
        }
        stream.finish()?;
        writer.finish()
    }

    /// Load any image format the `image` crate recognises by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<RasterImage, RasterError> {
        let path = path.as_ref();
        let format = image::ImageFormat::from_path(path).map_err(|_| {
            RasterError::UnsupportedImageType(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_string(),
            )
        })?;

        let mut reader = ImageReader::new(BufReader::new(File::open(path)?));
        reader.set_format(format);
        reader.no_limits();
        let decoded = reader.decode()?.into_rgba8();

        debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "Image loaded"
        );
        Ok(RasterImage::from_rgba_image(decoded))
    }
}
