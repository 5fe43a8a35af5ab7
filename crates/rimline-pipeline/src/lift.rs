//! 2D-to-3D lift: dereference the organized cloud at each contour
//! vertex to recover the world-frame curve behind the pixels.
//!
//! The cloud must already be in the world frame; the pipeline applies
//! the bundle transform to the whole cloud once before extraction.

use nalgebra::Point3;

use crate::types::{Curve, OrganizedCloud, PixelContour, RegionError};

/// Extract the 3D curve behind each pixel contour.
///
/// Vertices are dereferenced in contour order and kept as is, NaN
/// samples included; callers clean them with [`remove_nan`].
///
/// # Errors
///
/// - [`RegionError::CloudNotOrganized`] when the cloud has no grid
///   structure.
/// - [`RegionError::EmptyContour`] when `contours` is empty or any
///   contour has no vertices.
/// - [`RegionError::IndexOutOfBounds`] when a vertex falls outside the
///   cloud grid.
pub fn extract_contours(
    contours: &[PixelContour],
    cloud: &OrganizedCloud,
) -> Result<Vec<Curve>, RegionError> {
    if !cloud.is_organized() {
        return Err(RegionError::CloudNotOrganized);
    }
    if contours.is_empty() {
        return Err(RegionError::EmptyContour);
    }

    let mut curves = Vec::with_capacity(contours.len());
    for contour in contours {
        if contour.is_empty() {
            return Err(RegionError::EmptyContour);
        }

        let mut curve: Curve = Vec::with_capacity(contour.len());
        for p in contour {
            let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y)) else {
                return Err(RegionError::IndexOutOfBounds {
                    x: p.x,
                    y: p.y,
                    width: cloud.width(),
                    height: cloud.height(),
                });
            };
            if x >= cloud.width() || y >= cloud.height() {
                return Err(RegionError::IndexOutOfBounds {
                    x: p.x,
                    y: p.y,
                    width: cloud.width(),
                    height: cloud.height(),
                });
            }
            let sample = cloud.at(x, y);
            curve.push(Point3::new(
                f64::from(sample.x),
                f64::from(sample.y),
                f64::from(sample.z),
            ));
        }
        curves.push(curve);
    }
    Ok(curves)
}

/// Remove NaN vertices in place, preserving the order of the rest.
pub fn remove_nan(curve: &mut Curve) {
    curve.retain(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PixelPoint;

    fn plane_cloud(width: u32, height: u32) -> OrganizedCloud {
        OrganizedCloud::from_fn(width, height, |x, y| {
            Point3::new(x as f32 * 0.1, y as f32 * 0.1, 1.0)
        })
    }

    #[test]
    fn extracts_points_in_contour_order() {
        let cloud = plane_cloud(10, 10);
        let contour = vec![PixelPoint::new(0, 0), PixelPoint::new(3, 2)];
        let curves = extract_contours(&[contour], &cloud).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0][0], Point3::new(0.0, 0.0, 1.0));
        assert!((curves[0][1] - Point3::new(0.3, 0.2, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn unorganized_cloud_is_rejected() {
        let flat = OrganizedCloud::new(100, 1, vec![Point3::origin(); 100]).unwrap();
        let contour = vec![PixelPoint::new(0, 0)];
        let err = extract_contours(&[contour], &flat).unwrap_err();
        assert!(matches!(err, RegionError::CloudNotOrganized));
        assert_eq!(err.to_string(), "Point Cloud not organized");
    }

    #[test]
    fn empty_contour_list_is_rejected() {
        let err = extract_contours(&[], &plane_cloud(4, 4)).unwrap_err();
        assert!(matches!(err, RegionError::EmptyContour));
        assert_eq!(err.to_string(), "Empty indices vector");
    }

    #[test]
    fn contour_with_no_vertices_is_rejected() {
        let err = extract_contours(&[Vec::new()], &plane_cloud(4, 4)).unwrap_err();
        assert!(matches!(err, RegionError::EmptyContour));
    }

    #[test]
    fn width_index_is_out_of_bounds() {
        // (W, 0) is one past the last valid column.
        let cloud = plane_cloud(10, 10);
        let contour = vec![PixelPoint::new(10, 0)];
        let err = extract_contours(&[contour], &cloud).unwrap_err();
        assert!(matches!(err, RegionError::IndexOutOfBounds { .. }));
        assert_eq!(err.to_string(), "2D indices exceed point cloud size");
    }

    #[test]
    fn negative_index_is_out_of_bounds() {
        let cloud = plane_cloud(10, 10);
        let contour = vec![PixelPoint::new(-1, 0)];
        let err = extract_contours(&[contour], &cloud).unwrap_err();
        assert!(matches!(err, RegionError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn remove_nan_compacts_in_order() {
        let nan = f64::NAN;
        let mut curve = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(nan, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, nan, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        remove_nan(&mut curve);
        assert_eq!(
            curve,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        );
    }
}
