//! Statistical outlier removal for lifted curves.
//!
//! Each point's mean distance to its k nearest neighbours is compared
//! against the population of such means: points farther than
//! `mean + stddev_mult * stddev` are dropped. This removes stray cloud
//! samples that the pixel lookup picked up from depth discontinuities.

use log::debug;
use nalgebra::Point3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::types::{Curve, StatRemovalCfg};

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Filter the curve, keeping points whose mean k-neighbour distance is
/// within `stddev_mult` standard deviations of the population mean.
///
/// Sets too small to form neighbourhoods pass through unchanged.
#[must_use = "returns the filtered curve"]
pub fn remove_statistical_outliers(points: &[Point3<f64>], cfg: &StatRemovalCfg) -> Curve {
    if points.len() <= 2 || cfg.mean_k == 0 {
        return points.to_vec();
    }

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new([p.x, p.y, p.z], idx))
            .collect(),
    );

    let mean_distances: Vec<f64> = points
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let mut total = 0.0;
            let mut count = 0usize;
            for neighbour in tree.nearest_neighbor_iter(&[p.x, p.y, p.z]) {
                if neighbour.data == idx {
                    continue;
                }
                let q = Point3::from(*neighbour.geom());
                total += (p - q).norm();
                count += 1;
                if count == cfg.mean_k {
                    break;
                }
            }
            if count == 0 { 0.0 } else { total / count as f64 }
        })
        .collect();

    let n = mean_distances.len() as f64;
    let mean = mean_distances.iter().sum::<f64>() / n;
    let variance = mean_distances
        .iter()
        .map(|d| (d - mean) * (d - mean))
        .sum::<f64>()
        / (n - 1.0);
    let threshold = cfg.stddev_mult.mul_add(variance.sqrt(), mean);

    let kept: Curve = points
        .iter()
        .zip(&mean_distances)
        .filter(|&(_, d)| *d <= threshold)
        .map(|(&p, _)| p)
        .collect();

    debug!(
        "statistical outlier removal kept {} of {} points",
        kept.len(),
        points.len(),
    );
    kept
}
