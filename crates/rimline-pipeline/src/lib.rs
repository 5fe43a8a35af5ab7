//! rimline-pipeline: boundary-region extraction (sans-IO).
//!
//! Extracts ordered 3D boundary curves from fused bundles of
//! {color image, pixel-registered organized point cloud, rigid world
//! transform} and emits a 6-DoF pose per curve vertex through:
//! grayscale / dilation / threshold / Canny -> contour extraction ->
//! densification -> pixel-space conditioning (downsample, sequence,
//! split, hull simplification) -> 2D-to-3D lift -> normal estimation ->
//! cross-bundle curve merging -> pose frames.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! images and point buffers and returns structured data. Acquisition,
//! file formats, configuration loading, and visualization belong to the
//! embedding application. Logging goes through the `log` facade with
//! whatever sink the application installs.

pub mod contour;
pub mod densify;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod hull;
pub mod lift;
pub mod merge;
pub mod morph;
pub mod normals;
pub mod outlier;
pub mod pipeline;
pub mod pose;
pub mod sequence;
pub mod threshold;
pub mod types;
pub mod voxel;

pub use pipeline::RegionDetector;
pub use types::{
    Bundle, CannyCfg, ContourCfg, ContourMethod, ContourMode, Curve, DilationCfg, DilationShape,
    GrayImage, ImageCfg, NormalEstimationCfg, OrganizedCloud, PixelContour, PixelPoint,
    PixelSpaceCfg, PointNormal, Pose, RegionDetectionConfig, RegionError, RegionResult, RgbImage,
    SpatialCfg, StatRemovalCfg, ThresholdCfg, ThresholdKind,
};

/// Run the full pipeline over the given bundles with the given
/// configuration.
///
/// This is a convenience wrapper around [`RegionDetector::new`] and
/// [`RegionDetector::compute`] for one-shot callers.
///
/// # Errors
///
/// Returns [`RegionError::InvalidConfig`] for an invalid configuration
/// and otherwise whatever [`RegionDetector::compute`] reports; in
/// particular [`RegionError::NoClosedRegions`] when no closed boundary
/// was found.
pub fn detect_regions(
    bundles: &[Bundle],
    config: &RegionDetectionConfig,
) -> Result<RegionResult, RegionError> {
    RegionDetector::new(config.clone())?.compute(bundles)
}
