//! Cross-bundle curve assembly: merge open curves whose endpoints meet,
//! then simplify and filter the results.
//!
//! A region spanning several bundles arrives as open fragments. For
//! each unconsumed curve the merger repeatedly absorbs any other curve
//! whose closest endpoint pair is within the merge distance, reversing
//! the absorbed curve as needed to keep directional continuity, until
//! no candidate fits. Merged curves are then classified closed or open
//! by endpoint distance.

use log::debug;

use crate::types::Curve;

/// Merge open curves into larger curves and partition them into closed
/// and open sets.
///
/// A curve is absorbed only when the minimum of the four
/// endpoint-to-endpoint distances is strictly below `max_merge_dist`.
/// Curves whose endpoints end up within `closed_max_dist` are closed by
/// appending their first vertex.
#[must_use = "returns the (closed, open) partition"]
pub fn combine_into_closed_regions(
    curves: Vec<Curve>,
    max_merge_dist: f64,
    closed_max_dist: f64,
) -> (Vec<Curve>, Vec<Curve>) {
    let mut consumed = vec![false; curves.len()];
    let mut closed = Vec::new();
    let mut open = Vec::new();

    for i in 0..curves.len() {
        if consumed[i] {
            debug!("curve {i} has already been merged");
            continue;
        }
        consumed[i] = true;

        let mut curve = curves[i].clone();
        debug!("attempting to merge curve {i} with {} points", curve.len());

        loop {
            let mut merged_any = false;
            for (j, candidate) in curves.iter().enumerate() {
                if consumed[j] {
                    continue;
                }
                if let Some(combined) = merge_pair(&curve, candidate, max_merge_dist) {
                    debug!(
                        "merged curve {j} with {} points into curve {i}, final curve has {} points",
                        candidate.len(),
                        combined.len(),
                    );
                    curve = combined;
                    consumed[j] = true;
                    merged_any = true;
                }
            }
            if !merged_any {
                break;
            }
        }

        let (Some(&first), Some(&last)) = (curve.first(), curve.last()) else {
            continue;
        };
        if (first - last).norm() < closed_max_dist {
            curve.push(first);
            debug!("found closed curve with {} points", curve.len());
            closed.push(curve);
        } else {
            debug!("copied curve {i} into open curves vector");
            open.push(curve);
        }
    }

    debug!("found {} closed curves", closed.len());
    (closed, open)
}

/// Concatenate `c2` onto `c1` according to which endpoints are closest,
/// or `None` when even the closest endpoints are too far apart.
fn merge_pair(c1: &Curve, c2: &Curve, max_merge_dist: f64) -> Option<Curve> {
    let (c1_front, c1_back) = (c1.first()?, c1.last()?);
    let (c2_front, c2_back) = (c2.first()?, c2.last()?);

    let distances = [
        (c1_front - c2_front).norm(),
        (c1_front - c2_back).norm(),
        (c1_back - c2_front).norm(),
        (c1_back - c2_back).norm(),
    ];
    let (method, &min_dist) = distances
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    if min_dist >= max_merge_dist {
        return None;
    }

    let mut merged: Curve;
    match method {
        // front-to-front: reverse c2 and prepend.
        0 => {
            merged = c2.iter().rev().copied().collect();
            merged.extend_from_slice(c1);
        }
        // front-to-back: prepend c2.
        1 => {
            merged = c2.clone();
            merged.extend_from_slice(c1);
        }
        // back-to-front: append c2.
        2 => {
            merged = c1.clone();
            merged.extend_from_slice(c2);
        }
        // back-to-back: reverse c2 and append.
        _ => {
            merged = c1.clone();
            merged.extend(c2.iter().rev().copied());
        }
    }
    Some(merged)
}

/// Thin a curve to a minimum vertex spacing: the first vertex is kept,
/// interior vertices survive only when farther than `min_dist` from the
/// last kept vertex, and the last vertex is always kept.
#[must_use = "returns the simplified curves"]
pub fn simplify_by_min_length(curves: &[Curve], min_dist: f64) -> Vec<Curve> {
    curves
        .iter()
        .map(|curve| {
            let Some(&first) = curve.first() else {
                return Vec::new();
            };
            if curve.len() == 1 {
                return curve.clone();
            }

            let mut simplified = vec![first];
            for p in &curve[1..curve.len() - 1] {
                let last_kept = simplified[simplified.len() - 1];
                if (last_kept - p).norm() > min_dist {
                    simplified.push(*p);
                }
            }
            simplified.push(curve[curve.len() - 1]);
            simplified
        })
        .collect()
}

/// Drop curves with fewer than `min_num_points` vertices.
#[must_use = "returns the surviving curves"]
pub fn filter_by_min_points(curves: Vec<Curve>, min_num_points: usize) -> Vec<Curve> {
    curves
        .into_iter()
        .filter(|c| c.len() >= min_num_points)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    /// Unit-spaced points from `x0` to `x1` inclusive; the span must be
    /// integral.
    fn line(x0: f64, x1: f64, y: f64) -> Curve {
        let steps = (x1 - x0).abs().round() as i64;
        let dir = (x1 - x0).signum();
        (0..=steps).map(|i| p(x0 + dir * i as f64, y)).collect()
    }

    #[test]
    fn back_to_front_merge_appends() {
        let c1 = line(0.0, 5.0, 0.0);
        let c2 = line(5.5, 9.5, 0.0);
        let merged = merge_pair(&c1, &c2, 1.0).expect("curves should merge");
        assert_eq!(merged.len(), c1.len() + c2.len());
        assert_eq!(merged[0], p(0.0, 0.0));
        assert_eq!(*merged.last().unwrap(), p(9.5, 0.0));
    }

    #[test]
    fn back_to_back_merge_reverses_the_candidate() {
        let c1 = line(0.0, 5.0, 0.0);
        let c2 = line(9.5, 5.5, 0.0); // runs toward c1's back
        let merged = merge_pair(&c1, &c2, 1.0).expect("curves should merge");
        assert_eq!(merged[0], p(0.0, 0.0));
        assert_eq!(*merged.last().unwrap(), p(9.5, 0.0));
        // Directional continuity: x grows monotonically.
        for pair in merged.windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
    }

    #[test]
    fn front_to_front_merge_prepends_reversed() {
        let c1 = line(5.0, 10.0, 0.0);
        let c2 = line(4.5, 0.5, 0.0); // front near c1's front
        let merged = merge_pair(&c1, &c2, 1.0).expect("curves should merge");
        assert_eq!(merged[0], p(0.5, 0.0));
        assert_eq!(*merged.last().unwrap(), p(10.0, 0.0));
    }

    #[test]
    fn front_to_back_merge_prepends() {
        let c1 = line(5.0, 10.0, 0.0);
        let c2 = line(0.5, 4.5, 0.0);
        let merged = merge_pair(&c1, &c2, 1.0).expect("curves should merge");
        assert_eq!(merged[0], p(0.5, 0.0));
        assert_eq!(*merged.last().unwrap(), p(10.0, 0.0));
    }

    #[test]
    fn distance_equal_to_max_merge_dist_does_not_merge() {
        let c1 = line(0.0, 5.0, 0.0);
        let c2 = line(6.0, 10.0, 0.0); // closest endpoints exactly 1.0 apart
        assert!(merge_pair(&c1, &c2, 1.0).is_none());
    }

    #[test]
    fn two_half_rings_become_one_closed_curve() {
        // Two semicircle point runs sharing endpoints.
        let n = 16;
        let upper: Curve = (0..=n)
            .map(|i| {
                let angle = std::f64::consts::PI * f64::from(i) / f64::from(n);
                p(10.0 * angle.cos(), 10.0 * angle.sin())
            })
            .collect();
        let lower: Curve = (0..=n)
            .map(|i| {
                let angle = std::f64::consts::PI * f64::from(i) / f64::from(n);
                p(10.0 * angle.cos(), -10.0 * angle.sin())
            })
            .collect();

        let (closed, open) =
            combine_into_closed_regions(vec![upper, lower], 0.5, 0.5);
        assert_eq!(closed.len(), 1);
        assert!(open.is_empty());
        assert_eq!(closed[0].first(), closed[0].last());
    }

    #[test]
    fn distant_curves_stay_open_and_separate() {
        let c1 = line(0.0, 5.0, 0.0);
        let c2 = line(0.0, 5.0, 100.0);
        let (closed, open) = combine_into_closed_regions(vec![c1, c2], 1.0, 1.0);
        assert!(closed.is_empty());
        assert_eq!(open.len(), 2);
    }

    #[test]
    fn chain_of_three_fragments_merges_transitively() {
        let c1 = line(0.0, 5.0, 0.0);
        let c2 = line(5.5, 9.5, 0.0);
        let c3 = line(10.25, 14.25, 0.0);
        // c3 is too far from c1 directly; it joins through c2.
        let (closed, open) = combine_into_closed_regions(vec![c1, c3, c2], 1.0, 1.0);
        assert!(closed.is_empty());
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].len(), 16);
    }

    #[test]
    fn simplify_keeps_endpoints_and_spacing() {
        let curve: Curve = (0..11).map(|i| p(f64::from(i), 0.0)).collect();
        let simplified = simplify_by_min_length(&[curve], 2.5);
        assert_eq!(simplified.len(), 1);
        let s = &simplified[0];
        assert_eq!(s[0], p(0.0, 0.0));
        assert_eq!(*s.last().unwrap(), p(10.0, 0.0));
        for pair in s.windows(2).take(s.len() - 2) {
            assert!((pair[1] - pair[0]).norm() > 2.5);
        }
    }

    #[test]
    fn simplify_preserves_closure_duplicate() {
        // A closed curve keeps first == last through simplification.
        let mut ring: Curve = (0..12)
            .map(|i| {
                let angle = f64::from(i) / 12.0 * std::f64::consts::TAU;
                p(angle.cos(), angle.sin())
            })
            .collect();
        ring.push(ring[0]);
        let simplified = simplify_by_min_length(&[ring], 0.1);
        let s = &simplified[0];
        assert_eq!(s.first(), s.last());
    }

    #[test]
    fn filter_drops_short_curves() {
        let curves = vec![line(0.0, 2.0, 0.0), line(0.0, 9.0, 0.0)];
        let kept = filter_by_min_points(curves, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].len(), 10);
    }
}
