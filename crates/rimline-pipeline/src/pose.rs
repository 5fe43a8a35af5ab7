//! Pose construction: a right-handed frame at every vertex of every
//! surviving curve.
//!
//! Each vertex's normal is re-looked-up by nearest neighbour in the
//! accumulated position + normal cloud (merging and simplification
//! reorder and thin vertices, but never move them, so the lookup
//! recovers each vertex's own normal). The frame puts x along the
//! forward tangent and z along the surface normal, re-orthogonalized to
//! keep the rotation right-handed.

use log::debug;
use nalgebra::Vector3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::types::{Curve, PointNormal, Pose, RegionError};

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Compute one pose per vertex for each curve.
///
/// The last vertex has no forward neighbour; its tangent is the
/// reversed backward difference, so the frame keeps pointing along the
/// direction of travel. Curves with fewer than two vertices have no
/// tangent at all and are skipped.
///
/// # Errors
///
/// Returns [`RegionError::NoNormalsNearCurve`] when the normal cloud is
/// empty while a curve vertex needs a normal.
pub fn compute_poses(
    normal_cloud: &[PointNormal],
    curves: &[Curve],
) -> Result<Vec<Vec<Pose>>, RegionError> {
    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        normal_cloud
            .iter()
            .enumerate()
            .map(|(idx, pn)| {
                GeomWithData::new([pn.position.x, pn.position.y, pn.position.z], idx)
            })
            .collect(),
    );

    let mut curves_poses = Vec::with_capacity(curves.len());
    for (curve_idx, curve) in curves.iter().enumerate() {
        if curve.len() < 2 {
            debug!("skipping curve {curve_idx} with {} points, no tangent", curve.len());
            continue;
        }

        let normals = curve
            .iter()
            .map(|p| {
                tree.nearest_neighbor(&[p.x, p.y, p.z])
                    .map(|nearest| normal_cloud[nearest.data].normal)
                    .ok_or(RegionError::NoNormalsNearCurve)
            })
            .collect::<Result<Vec<Vector3<f64>>, _>>()?;

        debug!(
            "computing pose orientation vectors for curve {curve_idx} with {} points",
            curve.len(),
        );

        let mut poses = Vec::with_capacity(curve.len());
        for i in 0..curve.len() {
            let (current, next, sign) = if i + 1 < curve.len() {
                (i, i + 1, 1.0)
            } else {
                (i, i - 1, -1.0)
            };

            let x = (sign * (curve[next] - curve[current])).normalize();
            let z = normals[current].normalize();
            let y = z.cross(&x).normalize();
            let z = x.cross(&y).normalize();
            poses.push(Pose::from_axes(curve[current], x, y, z));
        }
        curves_poses.push(poses);
    }
    Ok(curves_poses)
}
