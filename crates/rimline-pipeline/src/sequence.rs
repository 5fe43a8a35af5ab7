//! Curve sequencing: order an unordered point set into a path by greedy
//! nearest-neighbour traversal, then split it at distance
//! discontinuities and classify the pieces as closed or open.
//!
//! Sequencing walks an R-tree of the not-yet-visited points, always
//! stepping to the nearest remaining point. When the next nearest point
//! is actually closer to the path's opposite end than to the current
//! tail, the path is reversed first, so the walk can extend from either
//! end. The result covers every input point exactly once.

use log::{debug, warn};
use nalgebra::Point3;
use rstar::RTree;

use crate::types::{Curve, MIN_POINT_DIST};

fn to_key(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Reorder a point set into a single path by greedy nearest-neighbour
/// traversal starting from the first point.
///
/// Ties between equidistant candidates resolve deterministically for a
/// fixed input order. A single-point input yields an empty path: a
/// point with no neighbour never joins a curve.
#[must_use = "returns the sequenced path"]
pub fn sequence(points: &[Point3<f64>]) -> Curve {
    if points.is_empty() {
        return Vec::new();
    }

    let mut remaining: RTree<[f64; 3]> =
        RTree::bulk_load(points.iter().map(to_key).collect());

    let mut sequenced: Curve = Vec::with_capacity(points.len());
    let mut current = points[0];
    remaining.remove_at_point(&to_key(&current));

    for _ in 1..points.len() {
        if remaining.size() == 0 {
            break;
        }
        let Some(nearest) = remaining.nearest_neighbor(&to_key(&current)) else {
            warn!("nearest neighbour search found no points near ({current:?})");
            break;
        };
        let closest = Point3::from(*nearest);

        if sequenced.is_empty() {
            sequenced.push(current);
        }

        // When the new point is nearer to the path's start than to its
        // tail, flip the path and extend from the other end.
        let start = sequenced[0];
        if (start - closest).norm() < (current - closest).norm() {
            sequenced.reverse();
        }

        sequenced.push(closest);
        current = closest;
        if remaining.remove_at_point(&to_key(&closest)).is_none() {
            // Non-removable (non-finite) coordinates would make the walk
            // revisit this point forever.
            warn!("found repeated point during reordering stage, should not happen but proceeding");
            break;
        }
    }

    debug!("sequenced {} points from {}", sequenced.len(), points.len());
    sequenced
}

/// Split a sequenced path wherever consecutive vertices are at least
/// `split_dist` apart.
///
/// Within each emitted segment, vertices closer than
/// [`MIN_POINT_DIST`] to their predecessor are dropped as duplicates,
/// and segments left with fewer than two vertices are discarded.
#[must_use = "returns the split segments"]
pub fn split(sequenced: &[Point3<f64>], split_dist: f64) -> Vec<Curve> {
    let mut segments: Vec<Curve> = Vec::new();
    let mut start_idx = 0;

    for i in 0..sequenced.len() {
        if i + 1 < sequenced.len() && (sequenced[i + 1] - sequenced[i]).norm() < split_dist {
            continue;
        }

        // The path has a discontinuity after i (or ends at i).
        if i == start_idx {
            debug!("ignoring segment of 1 point");
            start_idx = i + 1;
            continue;
        }

        let mut segment: Curve = Vec::with_capacity(i - start_idx + 1);
        for p in &sequenced[start_idx..=i] {
            if let Some(prev) = segment.last() {
                if (p - prev).norm() < MIN_POINT_DIST {
                    continue;
                }
            }
            segment.push(*p);
        }

        debug!(
            "creating sequence [{start_idx}, {i}] with {} points",
            segment.len(),
        );
        if segment.len() > 1 {
            segments.push(segment);
        } else {
            debug!("ignoring segment of 1 point");
        }
        start_idx = i + 1;
    }

    debug!("computed {} sequences", segments.len());
    segments
}

/// Partition sequenced curves into closed and open sets.
///
/// A curve whose endpoints are closer than `max_dist` is closed: its
/// first vertex is duplicated at the end and it goes to the closed set.
#[must_use = "returns the (closed, open) partition"]
pub fn classify_closed(curves: Vec<Curve>, max_dist: f64) -> (Vec<Curve>, Vec<Curve>) {
    let mut closed = Vec::new();
    let mut open = Vec::new();

    for mut curve in curves {
        let (Some(&first), Some(&last)) = (curve.first(), curve.last()) else {
            continue;
        };
        if (first - last).norm() < max_dist {
            curve.push(first);
            debug!("found closed curve with {} points", curve.len());
            closed.push(curve);
        } else {
            debug!("found open curve with {} points", curve.len());
            open.push(curve);
        }
    }
    (closed, open)
}
