//! Contour densification: fill pixel gaps by 8-connected linear
//! interpolation between consecutive contour vertices.
//!
//! Approximated contours jump many pixels between vertices. Every jump
//! wider than one pixel is replaced by equally spaced integer steps so
//! that each vertex has a cloud sample behind it after the lift.

use crate::types::{PixelContour, PixelPoint, MIN_PIXEL_DISTANCE};

/// Interpolate a contour into an 8-connected polyline.
///
/// For each consecutive pair (p1, p2) with Chebyshev distance
/// d = max(|dx|, |dy|): if d <= [`MIN_PIXEL_DISTANCE`] the pair is
/// already connected and p2 is kept as is; otherwise the d
/// intermediate-and-final points of the interpolated run from p1 to p2
/// are emitted, with nearest-integer rounding in both coordinates.
#[must_use = "returns the densified contour"]
pub fn densify(contour: &[PixelPoint]) -> PixelContour {
    let Some(&first) = contour.first() else {
        return Vec::new();
    };

    let mut result = vec![first];
    for pair in contour.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let d = dx.abs().max(dy.abs());
        if d <= MIN_PIXEL_DISTANCE {
            result.push(p2);
            continue;
        }

        for step in 1..=d {
            let t = f64::from(step) / f64::from(d);
            #[allow(clippy::cast_possible_truncation)]
            let p = PixelPoint::new(
                (f64::from(p1.x) + f64::from(dx) * t).round() as i32,
                (f64::from(p1.y) + f64::from(dy) * t).round() as i32,
            );
            result.push(p);
        }
    }
    result
}
