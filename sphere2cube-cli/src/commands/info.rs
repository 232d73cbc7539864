//! `sphere2cube info`: report what a conversion would produce without
//! decoding any pixels.

use std::path::PathBuf;

use clap::Args;
use sphere2cube::config::DEFAULT_TILE_SIZE;
use sphere2cube::converter::SourceImage;
use sphere2cube::pyramid::level_edges;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Source panorama
    pub input: PathBuf,

    /// Horizontal coverage of the source in degrees
    #[arg(long, default_value_t = 360.0)]
    pub angle: f64,

    /// Tile edge used to plan the pyramid
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,
}

/// Planned output for a source of the given width.
#[derive(Debug, PartialEq, Eq)]
pub struct Plan {
    pub outer_width: u32,
    pub face_edge: u32,
    pub level_edges: Vec<u32>,
}

pub fn plan(width: u32, angle: f64, tile_size: u32) -> Plan {
    let outer_width = (width as f64 * 360.0 / angle).round() as u32;
    let face_edge = width / 4;
    Plan {
        outer_width,
        face_edge,
        level_edges: level_edges(face_edge, tile_size),
    }
}

pub fn run(args: InfoArgs) -> Result<(), CliError> {
    if !(args.angle > 0.0 && args.angle <= 360.0) {
        return Err(CliError::Config(format!(
            "angle must be in (0, 360], got {}",
            args.angle
        )));
    }
    let (width, height) = SourceImage::dimensions(&args.input).map_err(CliError::Inspect)?;
    let plan = plan(width, args.angle, args.tile_size);

    println!("{}", args.input.display());
    println!("  Size:       {} x {}", width, height);
    println!("  Sphere:     {} x {}", plan.outer_width, plan.outer_width / 2);
    println!("  Face edge:  {}", plan.face_edge);
    println!("  Levels:     {:?}", plan.level_edges);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_full_sphere() {
        assert_eq!(
            plan(8192, 360.0, 512),
            Plan {
                outer_width: 8192,
                face_edge: 2048,
                level_edges: vec![512, 1024, 2048],
            }
        );
    }

    #[test]
    fn test_plan_partial_coverage() {
        let p = plan(4000, 180.0, 512);
        assert_eq!(p.outer_width, 8000);
        assert_eq!(p.face_edge, 1000);
        assert_eq!(p.level_edges, vec![500, 1000]);
    }
}
