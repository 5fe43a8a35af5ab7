//! Concave-hull simplification of closed pixel-space loops.
//!
//! A dense traced loop carries every border pixel; the concave hull
//! keeps only the vertices that shape the outline while still following
//! concave features. The hull vertex set comes back unordered for our
//! purposes, so it is re-sequenced and re-closed before use.

use geo::{ConcaveHull, MultiPoint};
use log::debug;
use nalgebra::Point3;

use crate::sequence;
use crate::types::Curve;

/// Simplify a closed z = 0 curve with a concave hull of the given
/// concavity, then re-sequence the hull vertices and close the result
/// by appending its first vertex.
///
/// Smaller `alpha` admits more concavities. Callers gate on a minimum
/// vertex count; the hull of very small sets degenerates.
#[must_use = "returns the simplified closed curve"]
pub fn simplify_closed_curve(curve: &[Point3<f64>], alpha: f64) -> Curve {
    let multipoint = MultiPoint::new(
        curve
            .iter()
            .map(|p| geo::Point::new(p.x, p.y))
            .collect(),
    );
    let hull = multipoint.concave_hull(alpha);

    // The exterior ring repeats its first coordinate at the end; drop
    // the duplicate before re-sequencing.
    let ring = hull.exterior();
    let mut vertices: Curve = ring
        .coords()
        .map(|c| Point3::new(c.x, c.y, 0.0))
        .collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    debug!(
        "concave hull simplified curve from {} to {} points",
        curve.len(),
        vertices.len(),
    );

    let mut sequenced = sequence::sequence(&vertices);
    if let Some(&first) = sequenced.first() {
        sequenced.push(first);
    }
    sequenced
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A noisy closed ring of `n` points around a circle of the given
    /// radius. Deterministic jitter from a small linear congruential
    /// generator.
    fn noisy_circle(n: usize, radius: f64) -> Curve {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut jitter = || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            ((state >> 33) as f64 / f64::from(u32::MAX) - 0.5) * 0.8
        };
        let mut curve: Curve = (0..n)
            .map(|i| {
                let angle = i as f64 / n as f64 * std::f64::consts::TAU;
                Point3::new(
                    radius.mul_add(angle.cos(), jitter()),
                    radius.mul_add(angle.sin(), jitter()),
                    0.0,
                )
            })
            .collect();
        curve.push(curve[0]);
        curve
    }

    #[test]
    fn hull_reduces_point_count_and_recloses() {
        let curve = noisy_circle(500, 50.0);
        let simplified = simplify_closed_curve(&curve, 5.0);

        assert!(
            simplified.len() < curve.len(),
            "expected fewer points after simplification ({} vs {})",
            simplified.len(),
            curve.len(),
        );
        assert!(simplified.len() > 3, "hull collapsed too far");
        assert_eq!(simplified.first(), simplified.last());
    }

    #[test]
    fn hull_vertices_come_from_the_input_neighbourhood() {
        let curve = noisy_circle(200, 30.0);
        let simplified = simplify_closed_curve(&curve, 5.0);
        for p in &simplified {
            let r = p.coords.norm();
            assert!(
                (28.0..=32.0).contains(&r),
                "hull vertex left the ring: radius {r}",
            );
        }
    }

    #[test]
    fn square_hull_keeps_the_corners() {
        // A dense square outline: every corner must survive.
        let mut curve: Curve = Vec::new();
        for i in 0..40 {
            curve.push(Point3::new(f64::from(i), 0.0, 0.0));
        }
        for i in 0..40 {
            curve.push(Point3::new(40.0, f64::from(i), 0.0));
        }
        for i in 0..40 {
            curve.push(Point3::new(f64::from(40 - i), 40.0, 0.0));
        }
        for i in 0..40 {
            curve.push(Point3::new(0.0, f64::from(40 - i), 0.0));
        }
        curve.push(curve[0]);

        let simplified = simplify_closed_curve(&curve, 10.0);
        for corner in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(40.0, 0.0, 0.0),
            Point3::new(40.0, 40.0, 0.0),
            Point3::new(0.0, 40.0, 0.0),
        ] {
            assert!(
                simplified
                    .iter()
                    .any(|p| (p - corner).norm() < 1e-9),
                "missing corner {corner:?}",
            );
        }
    }
}
