//! Voxel-grid downsampling: replace all points inside each cubic cell
//! by their centroid.
//!
//! Used both on pixel-space contours (leaf size in pixels, z = 0) and
//! on the 3D source cloud ahead of normal estimation. Output cells
//! appear in first-seen order, so identical inputs always produce
//! identical outputs.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::types::Curve;

/// Downsample the point set with the given cubic leaf size.
///
/// A non-positive leaf size disables the filter and returns the finite
/// input points unchanged. NaN points never reach the output.
#[must_use = "returns the downsampled points"]
pub fn downsample(points: &[Point3<f64>], leaf_size: f64) -> Curve {
    let finite = points.iter().copied().filter(|p| is_finite(p));
    if leaf_size <= 0.0 {
        return finite.collect();
    }

    let mut cells: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut sums: Vec<(Vector3<f64>, usize)> = Vec::new();

    for p in finite {
        #[allow(clippy::cast_possible_truncation)]
        let key = (
            (p.x / leaf_size).floor() as i64,
            (p.y / leaf_size).floor() as i64,
            (p.z / leaf_size).floor() as i64,
        );
        let slot = *cells.entry(key).or_insert_with(|| {
            sums.push((Vector3::zeros(), 0));
            sums.len() - 1
        });
        sums[slot].0 += p.coords;
        sums[slot].1 += 1;
    }

    sums.into_iter()
        .map(|(sum, count)| Point3::from(sum / count as f64))
        .collect()
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}
