//! The region detector: configuration holder and pipeline driver.
//!
//! One [`compute`](RegionDetector::compute) call runs every bundle
//! through the 2D image stage, pixel-space conditioning, the 3D lift,
//! and normal estimation, then assembles curves across bundles and
//! emits pose sequences. All intermediate buffers live on the call's
//! stack; the detector itself only holds the immutable configuration.

use log::{debug, info};
use nalgebra::Point3;

use crate::diagnostics::ContourRenderer;
use crate::types::{
    contour_to_points, points_to_contour, Bundle, Curve, ImageCfg, PixelContour, PointNormal,
    RegionDetectionConfig, RegionError, RegionResult, RgbImage,
};
use crate::{contour, densify, edge, grayscale, hull, lift, merge, morph, normals, outlier, pose,
    sequence, threshold, voxel};

/// Extracts region boundary curves from fused image + cloud bundles.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    config: RegionDetectionConfig,
}

impl RegionDetector {
    /// Create a detector with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] when the configuration
    /// violates a documented invariant.
    pub fn new(config: RegionDetectionConfig) -> Result<Self, RegionError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] when the new configuration
    /// is invalid; the previous configuration stays in effect.
    pub fn configure(&mut self, config: RegionDetectionConfig) -> Result<(), RegionError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RegionDetectionConfig {
        &self.config
    }

    /// Run the full pipeline over the given bundles.
    ///
    /// Succeeds iff at least one closed region was produced. Any
    /// per-stage failure aborts the whole computation.
    ///
    /// # Errors
    ///
    /// Propagates the stage errors of [`RegionError`]; when the
    /// pipeline completes without a single closed region the error is
    /// [`RegionError::NoClosedRegions`] carrying the assembled result.
    pub fn compute(&self, bundles: &[Bundle]) -> Result<RegionResult, RegionError> {
        let mut closed_contours: Vec<Curve> = Vec::new();
        let mut open_contours: Vec<Curve> = Vec::new();
        let mut normal_cloud: Vec<PointNormal> = Vec::new();
        let mut images: Vec<RgbImage> = Vec::new();
        let mut renderer = ContourRenderer::new();
        let mut window_counter = 0u32;

        for bundle in bundles {
            window_counter += 1;
            if self.config.image.debug_mode_enable {
                debug!(
                    "processing bundle as \"{}{window_counter}\"",
                    self.config.image.debug_window_name,
                );
            }

            debug!("computing 2d contours");
            let (pixel_contours, rendering) =
                self.compute_2d_contours(&bundle.image, &mut renderer)?;
            images.push(rendering);

            let (closed_2d, open_2d) = self.condition_contours(&pixel_contours);
            let closed_count = closed_2d.len();

            // Closed curves first so the lifted list splits by count.
            let lookups: Vec<PixelContour> = closed_2d
                .iter()
                .chain(open_2d.iter())
                .map(|points| points_to_contour(points))
                .collect();

            let world_cloud = bundle.cloud.transformed(&bundle.transform);

            debug!("extracting contours from 3d data");
            let mut curves = lift::extract_contours(&lookups, &world_cloud)?;

            for curve in &mut curves {
                debug!("NaN removal");
                lift::remove_nan(curve);

                if self.config.spatial.stat_removal.enable {
                    debug!("statistical outlier removal");
                    *curve =
                        outlier::remove_statistical_outliers(curve, &self.config.spatial.stat_removal);
                }
            }

            debug!("computing normals");
            let source_points: Vec<Point3<f64>> = world_cloud
                .points()
                .iter()
                .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
                .map(|p| Point3::new(f64::from(p.x), f64::from(p.y), f64::from(p.z)))
                .collect();
            let curve_normals = normals::compute_curve_normals(
                &source_points,
                &curves,
                &self.config.spatial.normal_est,
            )?;
            normal_cloud.extend(curve_normals.into_iter().flatten());

            let mut curves = curves.into_iter();
            closed_contours.extend(curves.by_ref().take(closed_count));
            open_contours.extend(curves);
        }

        // Fragments of one region may span bundles; try to close them.
        debug!(
            "computing closed contours from {} open curves",
            open_contours.len(),
        );
        let (merged_closed, merged_open) = merge::combine_into_closed_regions(
            open_contours,
            self.config.spatial.max_merge_dist,
            self.config.spatial.closed_curve_max_dist,
        );
        closed_contours.extend(merged_closed);
        let open_contours = merged_open;

        let closed_contours = merge::filter_by_min_points(
            merge::simplify_by_min_length(
                &closed_contours,
                self.config.spatial.simplification_min_dist,
            ),
            self.config.spatial.min_num_points,
        );
        let open_contours = merge::filter_by_min_points(
            merge::simplify_by_min_length(
                &open_contours,
                self.config.spatial.simplification_min_dist,
            ),
            self.config.spatial.min_num_points,
        );

        debug!("computing curve poses");
        let result = RegionResult {
            open_regions: pose::compute_poses(&normal_cloud, &open_contours)?,
            closed_regions: pose::compute_poses(&normal_cloud, &closed_contours)?,
            images,
        };

        info!(
            "found {} closed regions and {} open regions",
            result.closed_regions.len(),
            result.open_regions.len(),
        );
        if result.closed_regions.is_empty() {
            return Err(RegionError::NoClosedRegions(Box::new(result)));
        }
        Ok(result)
    }

    /// The 2D image stage: grayscale, optional inversion / dilation /
    /// threshold / Canny, then contour extraction and the diagnostic
    /// rendering.
    fn compute_2d_contours(
        &self,
        image: &RgbImage,
        renderer: &mut ContourRenderer,
    ) -> Result<(Vec<PixelContour>, RgbImage), RegionError> {
        let cfg: &ImageCfg = &self.config.image;

        let mut gray = grayscale::to_grayscale(image);
        self.stage_done("grayscale conversion");

        if cfg.invert_image {
            gray = grayscale::invert(gray);
            self.stage_done("inversion");
        }

        if cfg.dilation.enable {
            gray = morph::dilate(&gray, &cfg.dilation)?;
            self.stage_done("dilation");
        }

        if cfg.threshold.enable {
            gray = threshold::apply(&gray, &cfg.threshold);
            self.stage_done("threshold");
        }

        if cfg.canny.enable {
            gray = edge::canny(&gray, &cfg.canny)?;
            self.stage_done("canny");
        }

        let contours = contour::find_contours(&gray, &cfg.contour);
        info!("contour analysis found {} contours", contours.len());
        for (i, c) in contours.iter().enumerate() {
            debug!(
                "c[{i}]: s: {}, (p0: {:?}, pf: {:?})",
                c.len(),
                c.first(),
                c.last(),
            );
        }

        let rendering = renderer.render(image.width(), image.height(), &contours);
        Ok((contours, rendering))
    }

    fn stage_done(&self, stage: &str) {
        if self.config.image.debug_mode_enable {
            debug!("2d analysis: {stage}");
        }
    }

    /// Pixel-space conditioning: densify, downsample, sequence, split,
    /// classify, and simplify closed loops. Returns the closed and open
    /// z = 0 curves.
    fn condition_contours(&self, contours: &[PixelContour]) -> (Vec<Curve>, Vec<Curve>) {
        let cfg = &self.config.pixel;

        let mut segments: Vec<Curve> = Vec::new();
        for contour in contours {
            let dense = densify::densify(contour);
            let mut points = contour_to_points(&dense);
            if cfg.downsampling_radius > 0.0 {
                points = voxel::downsample(&points, cfg.downsampling_radius);
            }
            let sequenced = sequence::sequence(&points);
            segments.extend(sequence::split(&sequenced, cfg.split_dist));
        }

        let (mut closed, open) =
            sequence::classify_closed(segments, cfg.closed_curve_max_dist);

        for curve in &mut closed {
            if curve.len() < cfg.simplification_min_points {
                continue;
            }
            *curve = hull::simplify_closed_curve(curve, cfg.simplification_alpha);
        }

        (closed, open)
    }
}
