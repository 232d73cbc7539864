//! Backing storage for raster pixels.
//!
//! Small and medium images live in one contiguous buffer. Images whose byte
//! size exceeds the flat-allocation limit are split into one buffer per row
//! so no single allocation has to be that large.

/// Bytes per pixel (RGBA8).
pub(crate) const BYTES_PER_PIXEL: usize = 4;

/// Largest contiguous pixel buffer (in bytes) before switching to per-row
/// storage.
pub const DEFAULT_FLAT_LIMIT: usize = 2 << 30;

#[derive(Debug, Clone)]
pub(crate) enum Storage {
    Flat { data: Vec<u8>, stride: usize },
    Rows(Vec<Vec<u8>>),
}

impl Storage {
    /// Allocate zeroed storage for `width` × `height` pixels.
    pub(crate) fn allocate(width: u32, height: u32, flat_limit: usize) -> Self {
        let stride = width as usize * BYTES_PER_PIXEL;
        match stride.checked_mul(height as usize) {
            Some(total) if total <= flat_limit => Storage::Flat {
                data: vec![0u8; total],
                stride,
            },
            _ => Storage::Rows((0..height).map(|_| vec![0u8; stride]).collect()),
        }
    }

    pub(crate) fn is_flat(&self) -> bool {
        matches!(self, Storage::Flat { .. })
    }

    #[inline]
    pub(crate) fn row(&self, y: usize) -> &[u8] {
        match self {
            Storage::Flat { data, stride } => &data[y * stride..(y + 1) * stride],
            Storage::Rows(rows) => &rows[y],
        }
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u8] {
        match self {
            Storage::Flat { data, stride } => &mut data[y * *stride..(y + 1) * *stride],
            Storage::Rows(rows) => &mut rows[y],
        }
    }

    /// Set every pixel to `channels`.
    pub(crate) fn fill(&mut self, channels: [u8; 4]) {
        match self {
            Storage::Flat { data, .. } => fill_bytes(data, channels),
            Storage::Rows(rows) => rows.iter_mut().for_each(|row| fill_bytes(row, channels)),
        }
    }
}

fn fill_bytes(bytes: &mut [u8], channels: [u8; 4]) {
    for px in bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.copy_from_slice(&channels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_image_is_flat() {
        let storage = Storage::allocate(16, 16, DEFAULT_FLAT_LIMIT);
        assert!(storage.is_flat());
        assert_eq!(storage.row(15).len(), 64);
    }

    #[test]
    fn test_over_limit_uses_rows() {
        // 4×4×4 = 64 bytes, limit 63
        let storage = Storage::allocate(4, 4, 63);
        assert!(!storage.is_flat());
        assert_eq!(storage.row(3).len(), 16);
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert!(Storage::allocate(4, 4, 64).is_flat());
    }

    #[test]
    fn test_fill_and_row_access_agree() {
        for limit in [DEFAULT_FLAT_LIMIT, 0] {
            let mut storage = Storage::allocate(3, 2, limit);
            storage.fill([1, 2, 3, 4]);
            storage.row_mut(1)[4..8].copy_from_slice(&[9, 9, 9, 9]);

            assert_eq!(storage.row(0), &[1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
            assert_eq!(&storage.row(1)[4..8], &[9, 9, 9, 9]);
            assert_eq!(&storage.row(1)[8..12], &[1, 2, 3, 4]);
        }
    }
}
