//! Diagnostic rendering of extracted contours.
//!
//! One rendering per input bundle: the traced contours drawn on a black
//! canvas, each in its own color. Colors come from a generator seeded
//! per [`compute`](crate::RegionDetector::compute) call, so identical
//! inputs always render identically.

use image::Rgb;
use imageproc::drawing::draw_line_segment_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{PixelContour, RgbImage};

/// Seed of the per-call color generator.
const COLOR_SEED: u64 = 12345;

/// Draws contour renderings with one color stream per `compute` call.
pub struct ContourRenderer {
    rng: StdRng,
}

impl Default for ContourRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourRenderer {
    /// Create a renderer with a freshly seeded color stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::seed_from_u64(COLOR_SEED),
        }
    }

    /// Render the contours on a black canvas of the given size.
    ///
    /// Each contour is stroked in its own color as a closed outline
    /// (the last vertex connects back to the first). Single-vertex
    /// contours degenerate to a dot.
    pub fn render(&mut self, width: u32, height: u32, contours: &[PixelContour]) -> RgbImage {
        let mut canvas = RgbImage::new(width, height);
        for contour in contours {
            let color = Rgb([self.rng.gen(), self.rng.gen(), self.rng.gen()]);
            for pair in contour.windows(2) {
                draw_segment(&mut canvas, pair[0].x, pair[0].y, pair[1].x, pair[1].y, color);
            }
            if contour.len() > 2 {
                let (first, last) = (contour[0], contour[contour.len() - 1]);
                draw_segment(&mut canvas, last.x, last.y, first.x, first.y, color);
            }
            if contour.len() == 1 {
                let p = contour[0];
                if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                    canvas.put_pixel(p.x as u32, p.y as u32, color);
                }
            }
        }
        canvas
    }
}

#[allow(clippy::cast_precision_loss)]
fn draw_segment(canvas: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    draw_line_segment_mut(
        canvas,
        (x0 as f32, y0 as f32),
        (x1 as f32, y1 as f32),
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelPoint;

    fn square_contour() -> PixelContour {
        vec![
            PixelPoint::new(2, 2),
            PixelPoint::new(7, 2),
            PixelPoint::new(7, 7),
            PixelPoint::new(2, 7),
        ]
    }

    fn lit_count(img: &RgbImage) -> usize {
        img.pixels().filter(|p| p.0 != [0, 0, 0]).count()
    }

    #[test]
    fn canvas_matches_requested_size() {
        let mut renderer = ContourRenderer::new();
        let img = renderer.render(33, 17, &[]);
        assert_eq!(img.width(), 33);
        assert_eq!(img.height(), 17);
        assert_eq!(lit_count(&img), 0);
    }

    #[test]
    fn contour_pixels_are_drawn() {
        let mut renderer = ContourRenderer::new();
        let img = renderer.render(10, 10, &[square_contour()]);
        assert!(lit_count(&img) >= 16, "square outline too sparse");
        // The outline is closed: the left edge between first and last
        // vertex is stroked too.
        assert_ne!(img.get_pixel(2, 4).0, [0, 0, 0]);
    }

    #[test]
    fn rendering_is_deterministic_per_renderer() {
        let img_a = ContourRenderer::new().render(10, 10, &[square_contour()]);
        let img_b = ContourRenderer::new().render(10, 10, &[square_contour()]);
        assert_eq!(img_a, img_b);
    }

    #[test]
    fn distinct_contours_get_distinct_colors() {
        let mut renderer = ContourRenderer::new();
        let left = vec![PixelPoint::new(0, 0), PixelPoint::new(0, 5)];
        let right = vec![PixelPoint::new(9, 0), PixelPoint::new(9, 5)];
        let img = renderer.render(10, 10, &[left, right]);
        assert_ne!(img.get_pixel(0, 2), img.get_pixel(9, 2));
    }

    #[test]
    fn single_vertex_contour_draws_a_dot() {
        let mut renderer = ContourRenderer::new();
        let img = renderer.render(5, 5, &[vec![PixelPoint::new(3, 3)]]);
        assert_eq!(lit_count(&img), 1);
        assert_ne!(img.get_pixel(3, 3).0, [0, 0, 0]);
    }
}
