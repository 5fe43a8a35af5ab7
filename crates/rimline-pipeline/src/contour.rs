//! Contour extraction: trace borders in a binary image and compress
//! them according to the configured approximation method.
//!
//! Tracing is Suzuki-Abe border following via
//! `imageproc::contours::find_contours`. The retrieval mode selects
//! which borders survive; the approximation method controls how many
//! vertices each border keeps. The densification stage re-interpolates
//! every contour afterwards, so approximation only affects intermediate
//! buffer sizes, not the lifted geometry.

use crate::types::{ContourCfg, ContourMethod, ContourMode, GrayImage, PixelContour, PixelPoint};

/// Tolerance in pixels for the Ramer-Douglas-Peucker pass of the Tc89
/// approximation methods.
const TC89_RDP_TOLERANCE: f64 = 1.0;

/// Trace contours in the binary image and apply the configured
/// retrieval mode and approximation method.
#[must_use = "returns the traced pixel contours"]
pub fn find_contours(binary: &GrayImage, cfg: &ContourCfg) -> Vec<PixelContour> {
    let traced: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(binary);

    traced
        .into_iter()
        .filter(|c| match cfg.mode {
            ContourMode::External => c.parent.is_none(),
            ContourMode::List | ContourMode::CComp | ContourMode::Tree => true,
        })
        .map(|c| {
            let points: PixelContour = c
                .points
                .into_iter()
                .map(|p| PixelPoint::new(p.x, p.y))
                .collect();
            match cfg.method {
                ContourMethod::None => points,
                ContourMethod::Simple => compress_runs(&points),
                ContourMethod::Tc89L1 | ContourMethod::Tc89KCos => {
                    simplify_rdp(&compress_runs(&points), TC89_RDP_TOLERANCE)
                }
            }
        })
        .filter(|c| !c.is_empty())
        .collect()
}

/// Drop interior points of straight 8-connected runs, keeping the run
/// endpoints. The first and last vertex always survive.
fn compress_runs(points: &[PixelPoint]) -> PixelContour {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![points[0]];
    for window in points.windows(3) {
        let [prev, current, next] = [window[0], window[1], window[2]];
        let incoming = (current.x - prev.x, current.y - prev.y);
        let outgoing = (next.x - current.x, next.y - current.y);
        if incoming != outgoing {
            kept.push(current);
        }
    }
    kept.push(points[points.len() - 1]);
    kept
}

/// Ramer-Douglas-Peucker simplification over integer pixel vertices.
///
/// Points within `tolerance` pixels of the line between their segment
/// endpoints are removed.
fn simplify_rdp(points: &[PixelPoint], tolerance: f64) -> PixelContour {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;
    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, keep)| *keep)
        .map(|(&p, _)| p)
        .collect()
}

fn rdp_recurse(points: &[PixelPoint], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
/// When `a` and `b` coincide, the point-to-point distance.
fn perpendicular_distance(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let length_sq = dx.mul_add(dx, dy * dy);

    let px = f64::from(a.x - p.x);
    let py = f64::from(a.y - p.y);
    if length_sq == 0.0 {
        return px.hypot(py);
    }

    let cross = dx.mul_add(py, -(dy * px));
    cross.abs() / length_sq.sqrt()
}
