//! Surface normal estimation and assignment to curve vertices.
//!
//! The transformed source cloud is voxel-downsampled, each downsampled
//! point gets a normal from a PCA plane fit over its radius
//! neighbourhood (smallest-eigenvalue eigenvector of the covariance),
//! and every curve vertex copies the normal of its nearest downsampled
//! point while keeping its own position.

use log::debug;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::types::{Curve, NormalEstimationCfg, PointNormal, RegionError};
use crate::voxel;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Minimum neighbourhood size for a plane fit.
const MIN_PLANE_FIT_POINTS: usize = 3;

/// Assign a surface normal to every vertex of every curve.
///
/// Returns one `PointNormal` curve per input curve, positions taken
/// from the curve and normals from the nearest downsampled source
/// point.
///
/// # Errors
///
/// Returns [`RegionError::NoPointsNearCurve`] when the downsampled
/// source cloud is empty while a curve vertex needs a normal.
pub fn compute_curve_normals(
    source: &[Point3<f64>],
    curves: &[Curve],
    cfg: &NormalEstimationCfg,
) -> Result<Vec<Vec<PointNormal>>, RegionError> {
    let downsampled = voxel::downsample(source, cfg.downsampling_radius);
    let normals = estimate_normals(&downsampled, cfg);
    debug!(
        "estimated normals for {} downsampled source points",
        downsampled.len(),
    );

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        downsampled
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new([p.x, p.y, p.z], idx))
            .collect(),
    );

    let mut curve_normals = Vec::with_capacity(curves.len());
    for curve in curves {
        let mut with_normals = Vec::with_capacity(curve.len());
        for p in curve {
            let nearest = tree
                .nearest_neighbor(&[p.x, p.y, p.z])
                .ok_or(RegionError::NoPointsNearCurve)?;
            with_normals.push(PointNormal {
                position: *p,
                normal: normals[nearest.data],
            });
        }
        curve_normals.push(with_normals);
    }
    Ok(curve_normals)
}

/// Estimate one normal per point by PCA over the neighbourhood within
/// `search_radius`, oriented toward the configured viewpoint.
fn estimate_normals(points: &[Point3<f64>], cfg: &NormalEstimationCfg) -> Vec<Vector3<f64>> {
    let tree: RTree<[f64; 3]> =
        RTree::bulk_load(points.iter().map(|p| [p.x, p.y, p.z]).collect());
    let radius_sq = cfg.search_radius * cfg.search_radius;
    let viewpoint = Point3::from(Vector3::from(cfg.viewpoint));

    points
        .iter()
        .map(|p| {
            let neighbours: Vec<Point3<f64>> = tree
                .locate_within_distance([p.x, p.y, p.z], radius_sq)
                .map(|q| Point3::from(*q))
                .collect();
            let normal = plane_normal(&neighbours)
                .unwrap_or_else(|| fallback_normal(p, &viewpoint));
            orient_toward_viewpoint(normal, p, &viewpoint)
        })
        .collect()
}

/// Unit normal of the best-fit plane through the points: the
/// eigenvector of the covariance matrix with the smallest eigenvalue.
/// `None` when the neighbourhood is too small or degenerate.
fn plane_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < MIN_PLANE_FIT_POINTS {
        return None;
    }

    let centroid: Vector3<f64> =
        points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64;
    let mut covariance = Matrix3::zeros();
    for p in points {
        let v = p.coords - centroid;
        covariance += v * v.transpose();
    }

    let eigen = SymmetricEigen::new(covariance);
    let mut smallest = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] < eigen.eigenvalues[smallest] {
            smallest = i;
        }
    }
    let normal = eigen.eigenvectors.column(smallest).into_owned();
    if normal.norm() < 1e-12 {
        return None;
    }
    Some(normal.normalize())
}

/// Direction toward the viewpoint, used when no plane fit exists.
fn fallback_normal(p: &Point3<f64>, viewpoint: &Point3<f64>) -> Vector3<f64> {
    let toward = viewpoint - p;
    if toward.norm() < 1e-12 {
        Vector3::z()
    } else {
        toward.normalize()
    }
}

/// Flip the normal when it points away from the viewpoint.
fn orient_toward_viewpoint(
    normal: Vector3<f64>,
    p: &Point3<f64>,
    viewpoint: &Point3<f64>,
) -> Vector3<f64> {
    if normal.dot(&(viewpoint - p)) < 0.0 {
        -normal
    } else {
        normal
    }
}
