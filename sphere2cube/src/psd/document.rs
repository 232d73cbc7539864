//! Decoded layered document exposed as a [`PixelSource`].

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;
use std::time::Instant;

use tracing::info;

use super::decoder::{ScanlineDecoder, ScanlineTask};
use super::header::{Compression, PsdHeader, PsdLayout, PsdVersion};
use super::{FormatError, PsdError};
use crate::pixel::{Pixel, PixelSource};
use crate::progress::{Progress, Stage};

/// Options controlling how pixel data is decoded.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Worker threads for run-length decompression (1 decodes inline).
    pub threads: usize,
    /// Progress handle for the decode stage.
    pub progress: Progress,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            progress: Progress::none(),
        }
    }
}

impl DecodeOptions {
    /// Set the number of decode threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the progress handle.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }
}

/// A fully decoded PSD or PSB document.
///
/// Scanlines are stored channel-major: lines `0..height` hold red,
/// `height..2*height` green, and `2*height..3*height` blue. Any further
/// channels are kept but not used for pixel assembly; alpha is always
/// reported as opaque.
#[derive(Debug)]
pub struct PsdDocument {
    header: PsdHeader,
    compression: Compression,
    lines: Vec<Vec<u8>>,
    background: Pixel,
}

impl PsdDocument {
    /// Open and decode the document at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PsdError> {
        Self::open_with(path, &DecodeOptions::default())
    }

    /// Open and decode the document at `path`.
    pub fn open_with(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Self, PsdError> {
        let path = path.as_ref();
        let started = Instant::now();
        let mut reader = BufReader::new(File::open(path)?);
        let document = Self::read_from(&mut reader, options)?;
        info!(
            path = %path.display(),
            width = document.header.width,
            height = document.header.height,
            compression = ?document.compression,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document decoded"
        );
        Ok(document)
    }

    /// Decode a document from any seekable reader.
    pub fn read_from<R: Read + Seek>(reader: &mut R, options: &DecodeOptions) -> Result<Self, PsdError> {
        let layout = PsdLayout::read_from(reader)?;
        let header = layout.header;
        let width = header.width as usize;
        let count = header.line_count();

        let lines = match layout.compression {
            Compression::Raw => read_raw_lines(reader, count, width, &options.progress)?,
            Compression::Rle => {
                let tasks = layout
                    .line_lengths
                    .iter()
                    .enumerate()
                    .map(|(index, &len)| -> Result<ScanlineTask, PsdError> {
                        // Grows with the bytes actually read, so a bogus
                        // table entry cannot force a huge allocation
                        let mut compressed = Vec::new();
                        reader.by_ref().take(len as u64).read_to_end(&mut compressed)?;
                        if compressed.len() != len as usize {
                            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                        }
                        Ok(ScanlineTask {
                            index,
                            compressed,
                            target: vec![0u8; width],
                        })
                    });
                ScanlineDecoder::new(options.threads)
                    .with_progress(options.progress.clone())
                    .decode(count, tasks)?
            }
        };

        Ok(Self {
            header,
            compression: layout.compression,
            lines,
            background: Pixel::TRANSPARENT,
        })
    }

    /// Set the pixel returned for out-of-range lookups.
    pub fn with_background(mut self, background: Pixel) -> Self {
        self.background = background;
        self
    }

    pub fn set_background(&mut self, background: Pixel) {
        self.background = background;
    }

    pub fn header(&self) -> &PsdHeader {
        &self.header
    }

    pub fn version(&self) -> PsdVersion {
        self.header.version
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    /// Decoded scanline `index` (channel-major order).
    pub fn scanline(&self, index: usize) -> Option<&[u8]> {
        self.lines.get(index).map(Vec::as_slice)
    }
}

impl PixelSource for PsdDocument {
    fn width(&self) -> u32 {
        self.header.width
    }

    fn height(&self) -> u32 {
        self.header.height
    }

    fn get_pixel(&self, x: i64, y: i64) -> Pixel {
        if !self.contains(x, y) {
            return self.background;
        }
        let (x, y) = (x as usize, y as usize);
        let h = self.header.height as usize;
        Pixel::rgb(
            self.lines[y][x],
            self.lines[y + h][x],
            self.lines[y + 2 * h][x],
        )
    }

    fn background(&self) -> Pixel {
        self.background
    }
}

fn read_raw_lines<R: Read>(
    reader: &mut R,
    count: usize,
    width: usize,
    progress: &Progress,
) -> Result<Vec<Vec<u8>>, PsdError> {
    progress.begin(Stage::Decode, count as u64);
    let mut lines = Vec::new();
    lines
        .try_reserve_exact(count)
        .map_err(|_| FormatError::TooManyScanlines(count))?;
    for i in 0..count {
        let mut line = vec![0u8; width];
        reader.read_exact(&mut line)?;
        lines.push(line);
        progress.update(Stage::Decode, count as u64, i as u64 + 1);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 3-channel 2×2 raw document: R = 10*(x+1), G = 20, B = y.
    fn raw_document() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"8BPS");
        b.extend_from_slice(&1u16.to_be_bytes());
        b.extend_from_slice(&[0u8; 6]);
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(&2u32.to_be_bytes()); // height
        b.extend_from_slice(&2u32.to_be_bytes()); // width
        b.extend_from_slice(&8u16.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes()); // raw
        b.extend_from_slice(&[10, 20, 10, 20]); // R rows
        b.extend_from_slice(&[20, 20, 20, 20]); // G rows
        b.extend_from_slice(&[0, 0, 1, 1]); // B rows
        b
    }

    #[test]
    fn test_raw_document_pixels() {
        let doc = PsdDocument::read_from(
            &mut Cursor::new(raw_document()),
            &DecodeOptions::default().with_threads(1),
        )
        .unwrap();

        assert_eq!(doc.width(), 2);
        assert_eq!(doc.height(), 2);
        assert_eq!(doc.compression(), Compression::Raw);
        assert_eq!(doc.get_pixel(0, 0), Pixel::rgb(10, 20, 0));
        assert_eq!(doc.get_pixel(1, 1), Pixel::rgb(20, 20, 1));
    }

    #[test]
    fn test_out_of_range_returns_background() {
        let bg = Pixel::rgba(1, 2, 3, 4);
        let doc = PsdDocument::read_from(&mut Cursor::new(raw_document()), &DecodeOptions::default())
            .unwrap()
            .with_background(bg);

        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2), (i64::MAX, i64::MIN)] {
            assert_eq!(doc.get_pixel(x, y), bg);
        }
    }

    #[test]
    fn test_raw_document_with_absurd_line_count_fails_cleanly() {
        // 65535 channels × 4294967295 zero-width rows: nothing to read, but
        // the line list alone would need petabytes
        let mut bytes = raw_document();
        bytes[12..14].copy_from_slice(&0xFFFFu16.to_be_bytes());
        bytes[14..18].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        bytes[18..22].copy_from_slice(&0u32.to_be_bytes());

        let err = PsdDocument::read_from(&mut Cursor::new(bytes), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::TooManyScanlines(_))
        ));
    }

    #[test]
    fn test_truncated_pixel_data_is_io_error() {
        let mut bytes = raw_document();
        bytes.truncate(bytes.len() - 3);
        let err = PsdDocument::read_from(&mut Cursor::new(bytes), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, PsdError::Io(_)));
    }
}
