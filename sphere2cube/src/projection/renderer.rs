//! Cube face and preview rendering.

use std::time::Instant;

use tracing::{debug, info};

use super::equirect::Equirect;
use super::face::Face;
use crate::pixel::{Pixel, PixelSource};
use crate::progress::{Progress, Stage};
use crate::raster::RasterImage;

/// Renders cube faces from an embedded equirectangular source.
#[derive(Debug)]
pub struct Projector<S> {
    view: Equirect<S>,
    progress: Progress,
}

impl<S: PixelSource> Projector<S> {
    /// Project `source`, spanning `angle` degrees and shifted up by `pitch`
    /// degrees.
    pub fn new(source: S, angle: f64, pitch: f64) -> Self {
        Self::from_view(Equirect::new(source, angle, pitch))
    }

    pub fn from_view(view: Equirect<S>) -> Self {
        Self {
            view,
            progress: Progress::none(),
        }
    }

    /// Attach a progress handle.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn view(&self) -> &Equirect<S> {
        &self.view
    }

    /// Face edge used when the caller does not choose one.
    pub fn default_face_edge(&self) -> u32 {
        self.view.default_face_edge()
    }

    /// Render one `edge` × `edge` face.
    pub fn render_face(&self, face: Face, edge: u32) -> RasterImage {
        let started = Instant::now();
        let mut image = RasterImage::new(edge, edge).with_background(self.view.background());
        let stage = Stage::Face(face);
        let rows = edge as u64;
        self.progress.begin(stage, rows);

        for j in 0..edge {
            for i in 0..edge {
                let pixel = self.sample_face(face, edge, i, j);
                image.set_pixel(i as i64, j as i64, pixel);
            }
            self.progress.update(stage, rows, j as u64 + 1);
        }

        info!(
            face = face.name(),
            edge,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Face rendered"
        );
        image
    }

    /// Render a horizontal-cross preview about `width` pixels wide.
    ///
    /// The cross is `4E` × `3E` with `E = ⌊width / 4⌋`: back, left, front and
    /// right along the middle strip, top above and bottom below front.
    /// Pixels outside the six cells are the background. A width that is not
    /// a multiple of 4 is rounded down.
    pub fn render_preview(&self, width: u32) -> RasterImage {
        let edge = width / 4;
        let background = self.view.background();
        let mut image = RasterImage::new(edge * 4, edge * 3).with_background(background);
        if edge == 0 {
            return image;
        }
        image.fill(background);

        let rows = edge as u64 * 3;
        self.progress.begin(Stage::Preview, rows);
        for y in 0..edge * 3 {
            for x in 0..edge * 4 {
                if let Some(face) = Face::at_cross_cell(x / edge, y / edge) {
                    let pixel = self.sample_face(face, edge, x % edge, y % edge);
                    image.set_pixel(x as i64, y as i64, pixel);
                }
            }
            self.progress.update(Stage::Preview, rows, y as u64 + 1);
        }

        debug!(edge, "Preview rendered");
        image
    }

    /// Colour of face pixel `(i, j)` (column, row) on a face of size `edge`.
    #[inline]
    fn sample_face(&self, face: Face, edge: u32, i: u32, j: u32) -> Pixel {
        let a = 2.0 * i as f64 / edge as f64 - 1.0;
        let b = 2.0 * j as f64 / edge as f64 - 1.0;
        self.view.sample_direction(face.direction(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: Pixel) -> RasterImage {
        let mut image = RasterImage::new(width, height);
        image.fill(color);
        image
    }

    /// Each quarter of the width a different colour, top half brighter.
    fn quadrants(width: u32, height: u32) -> RasterImage {
        let mut image = RasterImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let q = (x * 4 / width) as u8;
                let lum = if y < height / 2 { 200 } else { 50 };
                image.set_pixel(x as i64, y as i64, Pixel::rgb(q * 60, lum, 255 - q * 60));
            }
        }
        image
    }

    #[test]
    fn test_solid_source_gives_solid_faces() {
        let color = Pixel::rgba(12, 200, 99, 255);
        let projector = Projector::new(solid(64, 32, color), 360.0, 0.0);

        for face in Face::ALL {
            let image = projector.render_face(face, 16);
            for y in 0..16 {
                for x in 0..16 {
                    assert_eq!(image.get_pixel(x, y), color, "{} ({}, {})", face, x, y);
                }
            }
        }
    }

    #[test]
    fn test_preview_matches_face_renders() {
        let projector = Projector::new(quadrants(96, 48), 360.0, 0.0);
        let edge = 12;
        let preview = projector.render_preview(edge * 4);

        assert_eq!(preview.width(), edge * 4);
        assert_eq!(preview.height(), edge * 3);

        for face in Face::ALL {
            let (column, row) = face.cross_cell();
            let cell = preview.crop(column * edge, row * edge, edge, edge);
            assert_eq!(cell, projector.render_face(face, edge), "{}", face);
        }
    }

    #[test]
    fn test_preview_width_rounds_down_to_whole_cells() {
        let projector = Projector::new(solid(16, 8, Pixel::WHITE), 360.0, 0.0);
        let preview = projector.render_preview(18);
        assert_eq!((preview.width(), preview.height()), (16, 12));
    }

    #[test]
    fn test_preview_outside_cells_is_background() {
        let bg = Pixel::rgba(9, 8, 7, 6);
        let projector = Projector::new(solid(32, 16, Pixel::WHITE).with_background(bg), 360.0, 0.0);
        let preview = projector.render_preview(18);

        // E = 4: 16 × 12
        assert_eq!((preview.width(), preview.height()), (16, 12));
        assert_eq!(preview.get_pixel(0, 0), bg);
        assert_eq!(preview.get_pixel(15, 11), bg);
        assert_eq!(preview.get_pixel(9, 1), Pixel::WHITE);
        assert_eq!(preview.get_pixel(0, 5), Pixel::WHITE);
    }

    #[test]
    fn test_front_faces_the_centre_of_the_source() {
        let projector = Projector::new(quadrants(64, 32), 360.0, 0.0);
        let front = projector.render_face(Face::Front, 8);
        let back = projector.render_face(Face::Back, 8);

        // theta = 0 lands at u = W/2, the start of the third quarter
        let centre = front.get_pixel(4, 2);
        assert_eq!(centre, Pixel::rgb(120, 200, 135));
        // theta = ±π lands at the seam between the last and first quarter
        assert_ne!(back.get_pixel(4, 2), centre);
    }

    #[test]
    fn test_partial_source_leaves_background_on_poles() {
        let bg = Pixel::rgba(0, 0, 0, 0);
        let projector = Projector::new(solid(64, 8, Pixel::WHITE), 360.0, 0.0);
        let top = projector.render_face(Face::Top, 8);
        let front = projector.render_face(Face::Front, 8);

        assert_eq!(top.get_pixel(4, 4), bg);
        assert_eq!(front.get_pixel(4, 4), Pixel::WHITE);
    }

    #[test]
    fn test_progress_reports_every_row() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let ticks = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&ticks);
        let projector = Projector::new(solid(16, 8, Pixel::WHITE), 360.0, 0.0).with_progress(
            Progress::from_fn(move |e| {
                if e.completed > 0 {
                    sink.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        projector.render_face(Face::Left, 6);
        assert_eq!(ticks.load(Ordering::SeqCst), 6);
    }
}
