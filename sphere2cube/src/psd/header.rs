//! Header and section parsing for PSD/PSB documents.
//!
//! Only the parts needed to reach the merged image data are interpreted:
//!
//! ```text
//! ┌────────────────────────────┐
//! │ File header (26 bytes)     │ signature, version, channels, size, depth, mode
//! ├────────────────────────────┤
//! │ Color mode data            │ u32 length + payload        (skipped)
//! ├────────────────────────────┤
//! │ Image resources            │ u32 length + payload        (skipped)
//! ├────────────────────────────┤
//! │ Layer and mask information │ u32 (PSD) / u64 (PSB) length (skipped)
//! ├────────────────────────────┤
//! │ Image data                 │ u16 compression, [line lengths], pixels
//! └────────────────────────────┘
//! ```
//!
//! All integers are big-endian.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::{FormatError, PsdError};

/// File signature of every PSD and PSB document.
pub const SIGNATURE: [u8; 4] = *b"8BPS";

/// Size of the fixed file header in bytes.
pub const HEADER_LEN: u64 = 26;

/// On-disk size variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsdVersion {
    /// Version 1: 32-bit section lengths, 16-bit scanline lengths.
    Psd,
    /// Version 2 ("large document"): 64-bit layer section length,
    /// 32-bit scanline lengths.
    Psb,
}

impl PsdVersion {
    fn from_raw(raw: u16) -> Result<Self, FormatError> {
        match raw {
            1 => Ok(PsdVersion::Psd),
            2 => Ok(PsdVersion::Psb),
            other => Err(FormatError::UnsupportedVersion(other)),
        }
    }

    /// Width in bytes of a layer-and-mask section length field.
    pub fn section_length_width(self) -> usize {
        match self {
            PsdVersion::Psd => 4,
            PsdVersion::Psb => 8,
        }
    }

    /// Width in bytes of one entry of the scanline length table.
    pub fn line_length_width(self) -> usize {
        match self {
            PsdVersion::Psd => 2,
            PsdVersion::Psb => 4,
        }
    }
}

/// How the merged image data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Raw,
    /// PackBits run-length encoding, one compressed run per scanline.
    Rle,
}

impl Compression {
    fn from_raw(raw: u16) -> Result<Self, FormatError> {
        match raw {
            0 => Ok(Compression::Raw),
            1 => Ok(Compression::Rle),
            other => Err(FormatError::UnsupportedCompression(other)),
        }
    }
}

/// The fixed 26-byte file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsdHeader {
    pub version: PsdVersion,
    pub channels: u16,
    pub height: u32,
    pub width: u32,
    /// Bits per channel.
    pub depth: u16,
    pub color_mode: u16,
}

impl PsdHeader {
    /// Parse and validate the file header.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, PsdError> {
        let mut buf = [0u8; HEADER_LEN as usize];
        reader.read_exact(&mut buf)?;

        let signature = [buf[0], buf[1], buf[2], buf[3]];
        if signature != SIGNATURE {
            return Err(FormatError::InvalidSignature(signature).into());
        }

        let version = PsdVersion::from_raw(be_u16(&buf[4..6]))?;
        // bytes 6..12 are reserved
        let header = PsdHeader {
            version,
            channels: be_u16(&buf[12..14]),
            height: be_u32(&buf[14..18]),
            width: be_u32(&buf[18..22]),
            depth: be_u16(&buf[22..24]),
            color_mode: be_u16(&buf[24..26]),
        };

        if header.depth != 8 {
            return Err(FormatError::UnsupportedDepth(header.depth).into());
        }
        if header.channels < 3 {
            return Err(FormatError::UnsupportedChannels(header.channels).into());
        }

        Ok(header)
    }

    /// Number of stored scanlines: one per row per channel.
    pub fn line_count(&self) -> usize {
        self.height as usize * self.channels as usize
    }
}

/// Everything known about a document before its pixels are decoded.
///
/// This is the result of the header-only fast path: callers that need only
/// the dimensions can stop here without decompressing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsdLayout {
    pub header: PsdHeader,
    pub compression: Compression,
    /// Compressed byte length of each scanline (empty for raw data).
    pub line_lengths: Vec<u32>,
    /// Absolute file offset of the first pixel byte.
    pub data_offset: u64,
}

impl PsdLayout {
    /// Parse the header and section structure from `reader`.
    ///
    /// On return the reader is positioned at `data_offset`.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self, PsdError> {
        let header = PsdHeader::read_from(reader)?;
        debug!(
            version = ?header.version,
            channels = header.channels,
            width = header.width,
            height = header.height,
            color_mode = header.color_mode,
            "Parsed document header"
        );

        let color_mode_len = read_u32(reader)? as u64;
        skip(reader, color_mode_len)?;

        let resources_len = read_u32(reader)? as u64;
        skip(reader, resources_len)?;

        let layer_mask_len = match header.version {
            PsdVersion::Psd => read_u32(reader)? as u64,
            PsdVersion::Psb => read_u64(reader)?,
        };
        skip(reader, layer_mask_len)?;
        debug!(
            color_mode_len,
            resources_len,
            layer_mask_len,
            "Skipped document sections"
        );

        let compression = Compression::from_raw(read_u16(reader)?)?;

        let line_lengths = match compression {
            Compression::Raw => Vec::new(),
            Compression::Rle => {
                let table_len = (header.line_count() as u64)
                    .checked_mul(header.version.line_length_width() as u64)
                    .ok_or(FormatError::SectionTooLarge(u64::MAX))?;
                // The table length comes from header fields; never allocate
                // more than the stream can actually hold.
                if table_len > remaining_len(reader)? {
                    return Err(FormatError::SectionTooLarge(table_len).into());
                }
                read_line_lengths(reader, header.version, table_len as usize)?
            }
        };

        let data_offset = reader.stream_position()?;

        Ok(Self {
            header,
            compression,
            line_lengths,
            data_offset,
        })
    }

    /// Header-only parse of the document at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PsdError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// Total compressed size of the image data section.
    pub fn compressed_len(&self) -> u64 {
        match self.compression {
            Compression::Raw => self.header.line_count() as u64 * self.header.width as u64,
            Compression::Rle => self.line_lengths.iter().map(|&l| l as u64).sum(),
        }
    }
}

fn read_line_lengths<R: Read>(
    reader: &mut R,
    version: PsdVersion,
    table_len: usize,
) -> Result<Vec<u32>, PsdError> {
    let width = version.line_length_width();
    let mut table = vec![0u8; table_len];
    reader.read_exact(&mut table)?;

    let lengths = table
        .chunks_exact(width)
        .map(|entry| match version {
            PsdVersion::Psd => be_u16(entry) as u32,
            PsdVersion::Psb => be_u32(entry),
        })
        .collect();
    Ok(lengths)
}

/// Bytes left between the current position and the end of the stream.
fn remaining_len<R: Seek>(reader: &mut R) -> Result<u64, PsdError> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

fn skip<R: Seek>(reader: &mut R, len: u64) -> Result<(), PsdError> {
    let offset = i64::try_from(len).map_err(|_| FormatError::SectionTooLarge(len))?;
    reader.seek(SeekFrom::Current(offset))?;
    Ok(())
}

fn read_u16<R: Read>(reader: &mut R) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

#[inline]
fn be_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

#[inline]
fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(version: u16, channels: u16, height: u32, width: u32, depth: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"8BPS");
        b.extend_from_slice(&version.to_be_bytes());
        b.extend_from_slice(&[0u8; 6]);
        b.extend_from_slice(&channels.to_be_bytes());
        b.extend_from_slice(&height.to_be_bytes());
        b.extend_from_slice(&width.to_be_bytes());
        b.extend_from_slice(&depth.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes());
        b
    }

    fn layout_bytes(version: u16, compression: u16) -> Vec<u8> {
        let mut b = header_bytes(version, 3, 2, 4, 8);
        // color mode data: 2 bytes payload
        b.extend_from_slice(&2u32.to_be_bytes());
        b.extend_from_slice(&[0xEE, 0xEE]);
        // image resources: 3 bytes payload
        b.extend_from_slice(&3u32.to_be_bytes());
        b.extend_from_slice(&[0xEE, 0xEE, 0xEE]);
        // layer and mask: 1 byte payload
        if version == 1 {
            b.extend_from_slice(&1u32.to_be_bytes());
        } else {
            b.extend_from_slice(&1u64.to_be_bytes());
        }
        b.push(0xEE);
        b.extend_from_slice(&compression.to_be_bytes());
        if compression == 1 {
            for i in 0..6u32 {
                if version == 1 {
                    b.extend_from_slice(&((i + 2) as u16).to_be_bytes());
                } else {
                    b.extend_from_slice(&(i + 2).to_be_bytes());
                }
            }
        }
        b
    }

    #[test]
    fn test_parse_header_fields() {
        let bytes = header_bytes(1, 4, 300, 600, 8);
        let header = PsdHeader::read_from(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(header.version, PsdVersion::Psd);
        assert_eq!(header.channels, 4);
        assert_eq!(header.height, 300);
        assert_eq!(header.width, 600);
        assert_eq!(header.line_count(), 1200);
    }

    #[test]
    fn test_invalid_signature() {
        let mut bytes = header_bytes(1, 3, 1, 1, 8);
        bytes[0] = b'X';
        let err = PsdHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_invalid_version() {
        let bytes = header_bytes(3, 3, 1, 1, 8);
        let err = PsdHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn test_unsupported_depth_and_channels() {
        let err = PsdHeader::read_from(&mut Cursor::new(header_bytes(1, 3, 1, 1, 16))).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnsupportedDepth(16))
        ));

        let err = PsdHeader::read_from(&mut Cursor::new(header_bytes(1, 1, 1, 1, 8))).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnsupportedChannels(1))
        ));
    }

    #[test]
    fn test_truncated_header_is_io_error() {
        let bytes = b"8BPS\x00\x01".to_vec();
        let err = PsdHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, PsdError::Io(_)));
    }

    #[test]
    fn test_layout_psd_rle() {
        let bytes = layout_bytes(1, 1);
        let expected_offset = bytes.len() as u64;
        let layout = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(layout.compression, Compression::Rle);
        assert_eq!(layout.line_lengths, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(layout.data_offset, expected_offset);
        assert_eq!(layout.compressed_len(), 27);
    }

    #[test]
    fn test_layout_psb_rle_uses_wide_fields() {
        let bytes = layout_bytes(2, 1);
        let layout = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(layout.header.version, PsdVersion::Psb);
        assert_eq!(layout.line_lengths, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_layout_raw_has_no_length_table() {
        let bytes = layout_bytes(1, 0);
        let layout = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(layout.compression, Compression::Raw);
        assert!(layout.line_lengths.is_empty());
        assert_eq!(layout.compressed_len(), 6 * 4);
    }

    #[test]
    fn test_oversized_length_table_is_rejected_without_allocating() {
        // 65535 channels × 4294967295 rows of u16 lengths, but only 8 bytes follow
        let mut bytes = header_bytes(1, 0xFFFF, 0xFFFF_FFFF, 4, 8);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        assert_eq!(bytes.len(), 48);

        let err = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::SectionTooLarge(len)) if *len == 0xFFFF * 0xFFFF_FFFF * 2
        ));
    }

    #[test]
    fn test_truncated_length_table_is_rejected() {
        let mut bytes = layout_bytes(1, 1);
        bytes.truncate(bytes.len() - 1);
        let err = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::SectionTooLarge(12))
        ));
    }

    #[test]
    fn test_layout_unknown_compression() {
        let bytes = layout_bytes(1, 2);
        let err = PsdLayout::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnsupportedCompression(2))
        ));
    }
}
