//! Shared helpers for integration tests: hand-built PSD/PSB byte streams.

#![allow(dead_code)]

use std::path::Path;

use sphere2cube::psd::PsdVersion;

/// A 3-channel document described plane by plane.
pub struct TestDocument {
    pub version: PsdVersion,
    pub width: u32,
    pub height: u32,
    /// One `width * height` plane per channel (R, G, B, ...).
    pub planes: Vec<Vec<u8>>,
    pub rle: bool,
    /// Bytes placed in the image resources section (skipped by readers).
    pub resources: Vec<u8>,
    /// Bytes placed in the layer and mask section (skipped by readers).
    pub layers: Vec<u8>,
}

impl TestDocument {
    /// Solid RGB document.
    pub fn solid(version: PsdVersion, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::from_fn(version, width, height, |_, _| rgb)
    }

    /// Document whose pixel at `(x, y)` is `f(x, y)`.
    pub fn from_fn(
        version: PsdVersion,
        width: u32,
        height: u32,
        f: impl Fn(u32, u32) -> [u8; 3],
    ) -> Self {
        let mut planes = vec![Vec::new(), Vec::new(), Vec::new()];
        for y in 0..height {
            for x in 0..width {
                let rgb = f(x, y);
                for (plane, value) in planes.iter_mut().zip(rgb) {
                    plane.push(value);
                }
            }
        }
        Self {
            version,
            width,
            height,
            planes,
            rle: true,
            resources: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn raw(mut self) -> Self {
        self.rle = false;
        self
    }

    /// Add junk to the skipped sections.
    pub fn with_sections(mut self, resources: &[u8], layers: &[u8]) -> Self {
        self.resources = resources.to_vec();
        self.layers = layers.to_vec();
        self
    }

    /// Add an extra channel (e.g. alpha) after the colour planes.
    pub fn with_extra_channel(mut self, value: u8) -> Self {
        self.planes
            .push(vec![value; (self.width * self.height) as usize]);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let psb = self.version == PsdVersion::Psb;
        let mut b = Vec::new();
        b.extend_from_slice(b"8BPS");
        b.extend_from_slice(&(if psb { 2u16 } else { 1u16 }).to_be_bytes());
        b.extend_from_slice(&[0u8; 6]);
        b.extend_from_slice(&(self.planes.len() as u16).to_be_bytes());
        b.extend_from_slice(&self.height.to_be_bytes());
        b.extend_from_slice(&self.width.to_be_bytes());
        b.extend_from_slice(&8u16.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes()); // RGB colour mode

        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&(self.resources.len() as u32).to_be_bytes());
        b.extend_from_slice(&self.resources);
        if psb {
            b.extend_from_slice(&(self.layers.len() as u64).to_be_bytes());
        } else {
            b.extend_from_slice(&(self.layers.len() as u32).to_be_bytes());
        }
        b.extend_from_slice(&self.layers);

        let lines: Vec<&[u8]> = self
            .planes
            .iter()
            .flat_map(|plane| plane.chunks(self.width as usize))
            .collect();

        if self.rle {
            b.extend_from_slice(&1u16.to_be_bytes());
            let encoded: Vec<Vec<u8>> = lines.iter().map(|line| packbits(line)).collect();
            for line in &encoded {
                if psb {
                    b.extend_from_slice(&(line.len() as u32).to_be_bytes());
                } else {
                    b.extend_from_slice(&(line.len() as u16).to_be_bytes());
                }
            }
            for line in &encoded {
                b.extend_from_slice(line);
            }
        } else {
            b.extend_from_slice(&0u16.to_be_bytes());
            for line in &lines {
                b.extend_from_slice(line);
            }
        }
        b
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

/// PackBits-encode one scanline.
pub fn packbits(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < line.len() {
        let mut run = 1;
        while i + run < line.len() && run < 128 && line[i + run] == line[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(line[i]);
            i += run;
        } else {
            let start = i;
            while i < line.len()
                && i - start < 128
                && (i + 1 >= line.len() || line[i + 1] != line[i])
            {
                i += 1;
            }
            out.push((i - start - 1) as u8);
            out.extend_from_slice(&line[start..i]);
        }
    }
    out
}
