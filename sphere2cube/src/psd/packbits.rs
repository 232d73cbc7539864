//! PackBits run-length decompression.
//!
//! Each control byte, read as a signed value, selects one of three actions:
//!
//! | control        | action                                        |
//! |----------------|-----------------------------------------------|
//! | `0..=127`      | copy the next `1 + n` bytes literally         |
//! | `-127..=-1`    | repeat the next single byte `1 - n` times     |
//! | `-128`         | no-op                                         |

use super::FormatError;

/// Decompress `source` into `target`.
///
/// Returns the number of bytes the stream expands to, which may be larger
/// than `target`; bytes past the end of `target` are counted but dropped.
/// Returns `None` when a run extends past the end of `source`.
pub fn decode_packbits(source: &[u8], target: &mut [u8]) -> Option<usize> {
    let mut written = 0usize;
    let mut pos = 0usize;

    while pos < source.len() {
        let control = source[pos] as i8;
        pos += 1;

        match control {
            -128 => continue,
            n if n < 0 => {
                let count = (1 - n as isize) as usize;
                let value = *source.get(pos)?;
                pos += 1;
                if written < target.len() {
                    let end = (written + count).min(target.len());
                    target[written..end].fill(value);
                }
                written += count;
            }
            n => {
                let count = n as usize + 1;
                let literal = source.get(pos..pos + count)?;
                pos += count;
                if written < target.len() {
                    let end = (written + count).min(target.len());
                    target[written..end].copy_from_slice(&literal[..end - written]);
                }
                written += count;
            }
        }
    }

    Some(written)
}

/// Decompress one scanline into a buffer of exactly the document width.
///
/// # Errors
///
/// - [`FormatError::TruncatedRun`] if the compressed data ends inside a run
/// - [`FormatError::ScanlineLength`] if the expanded length differs from
///   `target.len()`
pub fn decode_scanline(index: usize, source: &[u8], target: &mut [u8]) -> Result<(), FormatError> {
    let actual = decode_packbits(source, target).ok_or(FormatError::TruncatedRun { index })?;
    if actual != target.len() {
        return Err(FormatError::ScanlineLength {
            index,
            expected: target.len(),
            actual,
        });
    }
    Ok(())
}
