//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use sphere2cube::config::OutputFormat;
use sphere2cube::Pixel;

use crate::error::CliError;

/// Tile image format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TileFormat {
    /// Lossless PNG with transparency
    Png,
    /// JPEG (smaller, no transparency)
    Jpeg,
}

impl TileFormat {
    /// Convert to an output format, applying `quality` to JPEG.
    pub fn to_output_format(self, quality: u8) -> Result<OutputFormat, CliError> {
        match self {
            TileFormat::Png => Ok(OutputFormat::Png),
            TileFormat::Jpeg if quality > 100 => Err(CliError::Config(format!(
                "JPEG quality must be between 0 and 100, got {}",
                quality
            ))),
            TileFormat::Jpeg => Ok(OutputFormat::Jpeg { quality }),
        }
    }
}

/// Parse a hex colour: `RRGGBB` or `RRGGBBAA`, optionally prefixed by `#`.
pub fn parse_color(s: &str) -> Result<Pixel, String> {
    let hex = s.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "'{}' is not a colour (expected RRGGBB or RRGGBBAA in hex)",
            s
        ));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Pixel::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
}
