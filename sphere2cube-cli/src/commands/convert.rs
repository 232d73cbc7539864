//! `sphere2cube convert`: panorama in, tile pyramid out.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use sphere2cube::config::{
    ConvertConfig, TilePathTemplate, Watermark, DEFAULT_ANGLE, DEFAULT_JPEG_QUALITY,
    DEFAULT_TILE_SIZE, DEFAULT_TILE_TEMPLATE, DEFAULT_WATERMARK_SCALE,
};
use sphere2cube::converter::Converter;
use sphere2cube::projection::Face;
use sphere2cube::raster::Placement;
use sphere2cube::Pixel;
use tracing::info;

use super::common::{parse_color, TileFormat};
use crate::error::CliError;
use crate::progress::ProgressDisplay;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Source panorama (.psd, .psb, or any common image format)
    pub input: PathBuf,

    /// Output directory for tiles and previews
    pub output: PathBuf,

    /// Horizontal coverage of the source in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE)]
    pub angle: f64,

    /// Vertical shift in degrees (positive moves the source up)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub pitch: f64,

    /// Face edge in pixels (default: a quarter of the source width)
    #[arg(long)]
    pub face_edge: Option<u32>,

    /// Tile edge in pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    /// Tile image format
    #[arg(long, value_enum, default_value = "png")]
    pub format: TileFormat,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    pub quality: u8,

    /// Colour for areas the source does not cover (RRGGBB or RRGGBBAA)
    #[arg(long, value_parser = parse_color, default_value = "00000000")]
    pub background: Pixel,

    /// Faces to render (back, left, front, right, top, bottom or b,l,f,r,u,d)
    #[arg(long, value_delimiter = ',')]
    pub faces: Option<Vec<Face>>,

    /// Image stamped onto the centre of the bottom face
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Put the watermark underneath the panorama instead of on top
    #[arg(long, requires = "watermark")]
    pub watermark_below: bool,

    /// Watermark width as a fraction of the face edge
    #[arg(long, default_value_t = DEFAULT_WATERMARK_SCALE)]
    pub watermark_scale: f64,

    /// Write a horizontal-cross preview of this width (rounded down to a multiple of 4)
    #[arg(long)]
    pub preview: Option<u32>,

    /// Write an equirectangular preview no larger than this
    #[arg(long)]
    pub equirect_preview: Option<u32>,

    /// Also write each full-resolution face image
    #[arg(long)]
    pub write_faces: bool,

    /// Decode threads (default: available cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Tile path template relative to the output directory
    #[arg(long, default_value = DEFAULT_TILE_TEMPLATE)]
    pub tile_path: String,

    /// Hide progress bars
    #[arg(long, short)]
    pub quiet: bool,
}

impl ConvertArgs {
    /// Build the library configuration from command-line values.
    pub fn to_config(&self) -> Result<ConvertConfig, CliError> {
        let template =
            TilePathTemplate::parse(&self.tile_path).map_err(|e| CliError::Config(e.to_string()))?;

        let mut config = ConvertConfig::default()
            .with_angle(self.angle)
            .with_pitch(self.pitch)
            .with_tile_size(self.tile_size)
            .with_format(self.format.to_output_format(self.quality)?)
            .with_background(self.background)
            .with_face_images(self.write_faces)
            .with_tile_path(template);

        if let Some(edge) = self.face_edge {
            config = config.with_face_edge(edge);
        }
        if let Some(faces) = &self.faces {
            config = config.with_faces(faces.clone());
        }
        if let Some(path) = &self.watermark {
            let placement = if self.watermark_below {
                Placement::Below
            } else {
                Placement::Above
            };
            config = config.with_watermark(
                Watermark::new(path)
                    .with_placement(placement)
                    .with_scale(self.watermark_scale),
            );
        }
        if let Some(width) = self.preview {
            config = config.with_cross_preview(width);
        }
        if let Some(max) = self.equirect_preview {
            config = config.with_equirect_preview(max);
        }
        if let Some(threads) = self.threads {
            config = config.with_decode_threads(threads);
        }

        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }
}

pub fn run(args: ConvertArgs) -> Result<(), CliError> {
    let config = args.to_config()?;
    let started = Instant::now();

    let display = ProgressDisplay::new();
    let mut converter = Converter::new(config)?;
    if !args.quiet {
        converter = converter.with_progress(display.progress());
    }

    info!(input = %args.input.display(), output = %args.output.display(), "Converting");
    let result = converter.convert(&args.input, &args.output);
    display.finish();
    let summary = result?;

    println!();
    println!("Converted {}", args.input.display());
    println!("  Face edge:  {} px", summary.face_edge);
    println!("  Tile size:  {} px", summary.tile_size);
    println!(
        "  Levels:     {} ({})",
        summary.max_level + 1,
        summary
            .level_edges
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Tiles:      {}", summary.tiles_written);
    println!("  Output:     {}", args.output.display());
    println!("  Time:       {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}
