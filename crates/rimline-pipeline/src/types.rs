//! Shared types for the rimline region-extraction pipeline.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference intermediate
/// raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage`, the input image type and the diagnostic
/// rendering type.
pub use image::RgbImage;

/// Two pixel vertices this far apart (Chebyshev distance) or closer are
/// already 8-connected and need no interpolation between them.
pub const MIN_PIXEL_DISTANCE: i32 = 1;

/// Curve vertices closer than this to their predecessor are treated as
/// duplicates and dropped.
pub const MIN_POINT_DIST: f64 = 1e-8;

/// Default output value for binary threshold kinds.
pub const DEFAULT_MAX_BINARY_VALUE: u8 = 255;

/// An integer pixel coordinate in image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    /// Column, counted from the left edge.
    pub x: i32,
    /// Row, counted from the top edge.
    pub y: i32,
}

impl PixelPoint {
    /// Create a new pixel point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An ordered run of pixel vertices produced by contour extraction.
pub type PixelContour = Vec<PixelPoint>;

/// A curve in 3D space. In the pixel-space stages z is 0 for every
/// vertex; after the lift the coordinates are world-frame meters.
pub type Curve = Vec<Point3<f64>>;

/// Lift a pixel contour into a z = 0 point set so the 3D conditioning
/// algorithms (sequencing, splitting, voxel filtering) can run on it.
#[must_use]
pub fn contour_to_points(contour: &[PixelPoint]) -> Curve {
    contour
        .iter()
        .map(|p| Point3::new(f64::from(p.x), f64::from(p.y), 0.0))
        .collect()
}

/// Drop a z = 0 point set back to integer pixel coordinates.
///
/// Fractional coordinates (voxel centroids, hull vertices) truncate
/// toward zero, matching the organized-cloud indexing convention.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn points_to_contour(points: &[Point3<f64>]) -> PixelContour {
    points
        .iter()
        .map(|p| PixelPoint::new(p.x as i32, p.y as i32))
        .collect()
}

/// A 3D point cloud laid out as a width x height grid in pixel register
/// with an image: `at(x, y)` is the 3D sample behind pixel `(x, y)`.
/// Missing samples are NaN.
#[derive(Debug, Clone)]
pub struct OrganizedCloud {
    width: u32,
    height: u32,
    points: Vec<Point3<f32>>,
}

impl OrganizedCloud {
    /// Create a cloud from a row-major point buffer.
    ///
    /// Returns `None` when the buffer length does not equal
    /// `width * height`.
    #[must_use]
    pub fn new(width: u32, height: u32, points: Vec<Point3<f32>>) -> Option<Self> {
        if points.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            points,
        })
    }

    /// Create a cloud by evaluating `f` at every pixel coordinate.
    pub fn from_fn<F: FnMut(u32, u32) -> Point3<f32>>(width: u32, height: u32, mut f: F) -> Self {
        let mut points = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                points.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            points,
        }
    }

    /// Grid width in samples.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in samples.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cloud carries a 2D grid structure. A single-row cloud
    /// is an unorganized flat buffer and cannot be indexed by pixel.
    #[must_use]
    pub const fn is_organized(&self) -> bool {
        self.height > 1
    }

    /// The sample behind pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate is outside the grid; callers bound-check
    /// against [`width`](Self::width) and [`height`](Self::height) first.
    #[must_use]
    pub fn at(&self, x: u32, y: u32) -> Point3<f32> {
        assert!(x < self.width && y < self.height, "cloud index out of range");
        self.points[(y as usize) * (self.width as usize) + x as usize]
    }

    /// All samples in row-major order, NaN entries included.
    #[must_use]
    pub fn points(&self) -> &[Point3<f32>] {
        &self.points
    }

    /// Apply a rigid transform to every sample, producing a new cloud of
    /// the same shape. NaN samples stay NaN.
    #[must_use]
    pub fn transformed(&self, transform: &Isometry3<f32>) -> Self {
        Self {
            width: self.width,
            height: self.height,
            points: self.points.iter().map(|p| transform * p).collect(),
        }
    }
}

/// One fused input: an RGB image, the organized cloud registered with
/// it, and the rigid transform placing the cloud in the world frame.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// The color image consumed by the 2D stage.
    pub image: RgbImage,
    /// The pixel-registered 3D samples, same grid as `image`.
    pub cloud: OrganizedCloud,
    /// Camera-to-world rigid transform, single precision as delivered
    /// on the wire.
    pub transform: Isometry3<f32>,
}

/// A curve vertex paired with the surface normal assigned to it.
#[derive(Debug, Clone, Copy)]
pub struct PointNormal {
    /// Vertex position, world frame.
    pub position: Point3<f64>,
    /// Unit surface normal at the vertex.
    pub normal: Vector3<f64>,
}

/// A 6-DoF pose on a boundary curve.
///
/// The rotation is right-handed and orthonormal: the x axis is the
/// forward tangent along the curve, the z axis the surface normal, and
/// y = z x x the binormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Curve vertex the frame is attached to.
    pub position: Point3<f64>,
    /// Local frame at the vertex.
    pub orientation: Rotation3<f64>,
}

impl Pose {
    /// Assemble a pose from the three frame axes as rotation columns.
    #[must_use]
    pub fn from_axes(
        position: Point3<f64>,
        x: Vector3<f64>,
        y: Vector3<f64>,
        z: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            orientation: Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z])),
        }
    }

    /// Forward tangent axis.
    #[must_use]
    pub fn x_axis(&self) -> Vector3<f64> {
        self.orientation.matrix().column(0).into_owned()
    }

    /// Binormal axis.
    #[must_use]
    pub fn y_axis(&self) -> Vector3<f64> {
        self.orientation.matrix().column(1).into_owned()
    }

    /// Surface normal axis.
    #[must_use]
    pub fn z_axis(&self) -> Vector3<f64> {
        self.orientation.matrix().column(2).into_owned()
    }
}

/// Final output of a [`compute`](crate::RegionDetector::compute) call.
#[derive(Debug, Clone, Default)]
pub struct RegionResult {
    /// Pose sequences along closed boundary curves, one per region.
    pub closed_regions: Vec<Vec<Pose>>,
    /// Pose sequences along open (unclosed) curves.
    pub open_regions: Vec<Vec<Pose>>,
    /// One contour rendering per input bundle, in bundle order.
    pub images: Vec<RgbImage>,
}

/// Errors reported by the region-extraction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// A configuration value is out of range.
    #[error("invalid region detection configuration: {0}")]
    InvalidConfig(String),

    /// The input cloud has no grid structure and cannot be indexed by
    /// pixel coordinate.
    #[error("Point Cloud not organized")]
    CloudNotOrganized,

    /// A contour with no vertices (or no contours at all) reached the
    /// 2D-to-3D lift.
    #[error("Empty indices vector")]
    EmptyContour,

    /// A contour vertex fell outside the organized cloud's grid.
    #[error("2D indices exceed point cloud size")]
    IndexOutOfBounds {
        /// Offending pixel column.
        x: i32,
        /// Offending pixel row.
        y: i32,
        /// Cloud grid width.
        width: u32,
        /// Cloud grid height.
        height: u32,
    },

    /// The downsampled source cloud had no point to take a normal from.
    #[error("Found no points near curve")]
    NoPointsNearCurve,

    /// The accumulated normal cloud had no point near a curve vertex
    /// during pose construction.
    #[error("found no points near curve during pose computation")]
    NoNormalsNearCurve,

    /// The pipeline ran to completion but produced no closed region.
    /// The boxed result still carries the open regions and diagnostic
    /// images so callers can inspect what was found.
    #[error("no closed regions were detected")]
    NoClosedRegions(Box<RegionResult>),
}

/// Structuring element shape for the dilation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DilationShape {
    /// Square element, every cell set.
    #[default]
    Rect,
    /// Cross-shaped element (L1 ball).
    Cross,
    /// Disc-shaped element (L2 ball).
    Ellipse,
}

/// Optional morphological dilation of the grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilationCfg {
    /// Whether the stage runs at all.
    pub enable: bool,
    /// Half-size k of the (2k+1) x (2k+1) structuring element, anchored
    /// at its center. Must be in [1, 255] when the stage is enabled.
    pub kernel_size: i32,
    /// Structuring element shape.
    pub elem: DilationShape,
}

/// Thresholding rule applied per pixel, `t` being the configured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThresholdKind {
    /// `v > t` becomes `max_binary_value`, everything else 0.
    #[default]
    Binary,
    /// `v > t` becomes 0, everything else `max_binary_value`.
    BinaryInverted,
    /// `v > t` is clamped to `t`, everything else passes through.
    Truncate,
    /// `v > t` passes through, everything else becomes 0.
    ToZero,
    /// `v > t` becomes 0, everything else passes through.
    ToZeroInverted,
}

/// Optional intensity thresholding of the grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCfg {
    /// Whether the stage runs at all.
    pub enable: bool,
    /// Threshold value `t`.
    pub value: u8,
    /// Per-pixel rule.
    pub kind: ThresholdKind,
    /// Output value for the binary rules, typically 255.
    pub max_binary_value: u8,
}

/// Optional Canny edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyCfg {
    /// Whether the stage runs at all.
    pub enable: bool,
    /// Hysteresis low threshold: weaker gradients are never edges.
    pub lower_threshold: f32,
    /// Hysteresis high threshold: stronger gradients are always edges.
    pub upper_threshold: f32,
    /// Stored aperture parameter k; the effective Sobel aperture is
    /// `max(3, 2k + 1)` and must come out to 3, 5, or 7.
    pub aperture_size: i32,
}

impl CannyCfg {
    /// The Sobel aperture actually used: `max(3, 2k + 1)`.
    #[must_use]
    pub const fn effective_aperture(&self) -> i32 {
        let aperture = 2 * self.aperture_size + 1;
        if aperture < 3 { 3 } else { aperture }
    }
}

/// Which traced borders the contour stage keeps.
///
/// The pipeline consumes flat vertex lists and discards the border
/// hierarchy, so `List`, `CComp`, and `Tree` select the same contours;
/// `External` keeps only top-level borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourMode {
    /// Only outermost borders (those without a parent).
    #[default]
    External,
    /// Every border, flat.
    List,
    /// Every border, two-level hierarchy in the source system.
    CComp,
    /// Every border, full hierarchy in the source system.
    Tree,
}

/// How aggressively traced contours are compressed before
/// densification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourMethod {
    /// Keep every border pixel.
    None,
    /// Drop interior points of straight 8-connected runs.
    #[default]
    Simple,
    /// Run compression followed by a 1-pixel Ramer-Douglas-Peucker pass.
    Tc89L1,
    /// Same approximation as [`Tc89L1`](Self::Tc89L1).
    Tc89KCos,
}

/// Contour extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContourCfg {
    /// Border retrieval policy.
    pub mode: ContourMode,
    /// Vertex approximation method.
    pub method: ContourMethod,
}

/// Options for the 2D image stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCfg {
    /// Invert the grayscale image (v becomes 255 - v) before the
    /// remaining stages.
    pub invert_image: bool,
    /// Morphological dilation options.
    pub dilation: DilationCfg,
    /// Threshold options.
    pub threshold: ThresholdCfg,
    /// Canny edge detection options.
    pub canny: CannyCfg,
    /// Contour extraction options.
    pub contour: ContourCfg,
    /// Emit verbose per-stage debug logging.
    pub debug_mode_enable: bool,
    /// Base name for diagnostic renderings; the per-call window counter
    /// is appended. Interactive display belongs to the caller.
    pub debug_window_name: String,
    /// Carried for interactive front-ends that block on a keypress
    /// between stages; the library itself never blocks.
    pub debug_wait_key: bool,
}

/// Options for conditioning curves in pixel space (z = 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSpaceCfg {
    /// Voxel leaf size for pixel-space downsampling; 0 disables the
    /// filter.
    pub downsampling_radius: f64,
    /// Sequenced curves are cut wherever consecutive vertices are at
    /// least this far apart.
    pub split_dist: f64,
    /// A curve whose endpoints are closer than this is closed.
    pub closed_curve_max_dist: f64,
    /// Closed curves with fewer vertices than this skip concave-hull
    /// simplification.
    pub simplification_min_points: usize,
    /// Concavity parameter of the hull; smaller values admit more
    /// concavities.
    pub simplification_alpha: f64,
}

/// Statistical outlier removal options for lifted curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRemovalCfg {
    /// Whether the filter runs at all.
    pub enable: bool,
    /// Number of nearest neighbours averaged per point.
    pub mean_k: usize,
    /// A point is an outlier when its mean neighbour distance exceeds
    /// the population mean by more than this many standard deviations.
    pub stddev_mult: f64,
}

/// Surface normal estimation options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalEstimationCfg {
    /// Voxel leaf size applied to the source cloud before normal
    /// estimation; 0 disables the downsampling.
    pub downsampling_radius: f64,
    /// Neighbourhood radius of the per-point plane fit.
    pub search_radius: f64,
    /// Normals are flipped to point toward this position.
    pub viewpoint: [f64; 3],
    /// Maximum acceptable approximation slack for the nearest-neighbour
    /// lookup. The R-tree search is exact, which satisfies any
    /// non-negative slack; the field keeps configurations from the
    /// source system valid.
    pub kdtree_epsilon: f64,
}

/// Options for the world-frame (3D) stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialCfg {
    /// Open curves whose closest endpoints are nearer than this merge
    /// into one curve (strict inequality).
    pub max_merge_dist: f64,
    /// A merged curve whose endpoints are closer than this is closed.
    pub closed_curve_max_dist: f64,
    /// Minimum spacing kept between consecutive vertices by the final
    /// simplification.
    pub simplification_min_dist: f64,
    /// Curves with fewer vertices than this are dropped from the
    /// result. Must be at least 2.
    pub min_num_points: usize,
    /// Statistical outlier removal options.
    pub stat_removal: StatRemovalCfg,
    /// Normal estimation options.
    pub normal_est: NormalEstimationCfg,
}

/// Configuration for the whole pipeline.
///
/// All parameters have defaults tuned for millimeter-scale parts imaged
/// at roughly one pixel per millimeter; real deployments override them
/// per sensor. [`validate`](Self::validate) checks the documented
/// invariants and is called by the detector's constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDetectionConfig {
    /// 2D image stage options.
    pub image: ImageCfg,
    /// Pixel-space curve conditioning options.
    pub pixel: PixelSpaceCfg,
    /// World-frame assembly options.
    pub spatial: SpatialCfg,
}

impl RegionDetectionConfig {
    /// Default threshold value.
    pub const DEFAULT_THRESHOLD_VALUE: u8 = 150;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOWER: f32 = 50.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_UPPER: f32 = 150.0;
    /// Default pixel-space split distance.
    pub const DEFAULT_SPLIT_DIST: f64 = 6.0;
    /// Default pixel-space closure distance.
    pub const DEFAULT_PIXEL_CLOSED_CURVE_MAX_DIST: f64 = 6.0;
    /// Default vertex count below which closed loops skip hull
    /// simplification.
    pub const DEFAULT_SIMPLIFICATION_MIN_POINTS: usize = 10;
    /// Default hull concavity.
    pub const DEFAULT_SIMPLIFICATION_ALPHA: f64 = 2.0;
    /// Default endpoint merge distance.
    pub const DEFAULT_MAX_MERGE_DIST: f64 = 0.01;
    /// Default world-frame closure distance.
    pub const DEFAULT_SPATIAL_CLOSED_CURVE_MAX_DIST: f64 = 0.01;
    /// Default minimum vertex spacing of the final simplification.
    pub const DEFAULT_SIMPLIFICATION_MIN_DIST: f64 = 0.0;
    /// Default minimum vertex count of an emitted region.
    pub const DEFAULT_MIN_NUM_POINTS: usize = 10;
    /// Default neighbour count for outlier removal.
    pub const DEFAULT_STAT_MEAN_K: usize = 20;
    /// Default standard deviation multiplier for outlier removal.
    pub const DEFAULT_STAT_STDDEV_MULT: f64 = 1.0;
    /// Default voxel leaf for normal estimation.
    pub const DEFAULT_NORMAL_DOWNSAMPLING_RADIUS: f64 = 0.01;
    /// Default plane-fit radius for normal estimation.
    pub const DEFAULT_NORMAL_SEARCH_RADIUS: f64 = 0.02;
    /// Default normal orientation viewpoint.
    pub const DEFAULT_VIEWPOINT: [f64; 3] = [0.0, 0.0, 10.0];
    /// Default nearest-neighbour slack.
    pub const DEFAULT_KDTREE_EPSILON: f64 = 1e-5;

    /// Validate that all fields satisfy the documented invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] describing the first
    /// violated constraint.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.image.dilation.enable && !(1..=255).contains(&self.image.dilation.kernel_size) {
            return Err(RegionError::InvalidConfig(format!(
                "dilation kernel_size must be in [1, 255], got {}",
                self.image.dilation.kernel_size,
            )));
        }
        if self.image.canny.enable {
            if self.image.canny.aperture_size < 0 {
                return Err(RegionError::InvalidConfig(format!(
                    "canny aperture_size must be non-negative, got {}",
                    self.image.canny.aperture_size,
                )));
            }
            let aperture = self.image.canny.effective_aperture();
            if aperture > 7 {
                return Err(RegionError::InvalidConfig(format!(
                    "canny effective aperture must be 3, 5, or 7, got {aperture}",
                )));
            }
            if self.image.canny.lower_threshold > self.image.canny.upper_threshold {
                return Err(RegionError::InvalidConfig(format!(
                    "canny lower_threshold ({}) must not exceed upper_threshold ({})",
                    self.image.canny.lower_threshold, self.image.canny.upper_threshold,
                )));
            }
        }
        if self.pixel.downsampling_radius < 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "pixel downsampling_radius must be non-negative, got {}",
                self.pixel.downsampling_radius,
            )));
        }
        if self.pixel.split_dist <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "split_dist must be positive, got {}",
                self.pixel.split_dist,
            )));
        }
        if self.pixel.closed_curve_max_dist <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "pixel closed_curve_max_dist must be positive, got {}",
                self.pixel.closed_curve_max_dist,
            )));
        }
        if self.pixel.simplification_min_points < 4 {
            return Err(RegionError::InvalidConfig(format!(
                "simplification_min_points must be at least 4, got {}",
                self.pixel.simplification_min_points,
            )));
        }
        if self.pixel.simplification_alpha <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "simplification_alpha must be positive, got {}",
                self.pixel.simplification_alpha,
            )));
        }
        if self.spatial.max_merge_dist <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "max_merge_dist must be positive, got {}",
                self.spatial.max_merge_dist,
            )));
        }
        if self.spatial.closed_curve_max_dist <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "spatial closed_curve_max_dist must be positive, got {}",
                self.spatial.closed_curve_max_dist,
            )));
        }
        if self.spatial.simplification_min_dist < 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "simplification_min_dist must be non-negative, got {}",
                self.spatial.simplification_min_dist,
            )));
        }
        if self.spatial.min_num_points < 2 {
            return Err(RegionError::InvalidConfig(format!(
                "min_num_points must be at least 2, got {}",
                self.spatial.min_num_points,
            )));
        }
        if self.spatial.stat_removal.enable && self.spatial.stat_removal.mean_k == 0 {
            return Err(RegionError::InvalidConfig(
                "stat_removal mean_k must be positive".to_owned(),
            ));
        }
        if self.spatial.normal_est.downsampling_radius < 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "normal_est downsampling_radius must be non-negative, got {}",
                self.spatial.normal_est.downsampling_radius,
            )));
        }
        if self.spatial.normal_est.search_radius <= 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "normal_est search_radius must be positive, got {}",
                self.spatial.normal_est.search_radius,
            )));
        }
        if self.spatial.normal_est.kdtree_epsilon < 0.0 {
            return Err(RegionError::InvalidConfig(format!(
                "normal_est kdtree_epsilon must be non-negative, got {}",
                self.spatial.normal_est.kdtree_epsilon,
            )));
        }
        Ok(())
    }
}

impl Default for RegionDetectionConfig {
    fn default() -> Self {
        Self {
            image: ImageCfg {
                invert_image: false,
                dilation: DilationCfg {
                    enable: false,
                    kernel_size: 1,
                    elem: DilationShape::Rect,
                },
                threshold: ThresholdCfg {
                    enable: true,
                    value: Self::DEFAULT_THRESHOLD_VALUE,
                    kind: ThresholdKind::Binary,
                    max_binary_value: DEFAULT_MAX_BINARY_VALUE,
                },
                canny: CannyCfg {
                    enable: false,
                    lower_threshold: Self::DEFAULT_CANNY_LOWER,
                    upper_threshold: Self::DEFAULT_CANNY_UPPER,
                    aperture_size: 1,
                },
                contour: ContourCfg::default(),
                debug_mode_enable: false,
                debug_window_name: "region_detection".to_owned(),
                debug_wait_key: false,
            },
            pixel: PixelSpaceCfg {
                downsampling_radius: 0.0,
                split_dist: Self::DEFAULT_SPLIT_DIST,
                closed_curve_max_dist: Self::DEFAULT_PIXEL_CLOSED_CURVE_MAX_DIST,
                simplification_min_points: Self::DEFAULT_SIMPLIFICATION_MIN_POINTS,
                simplification_alpha: Self::DEFAULT_SIMPLIFICATION_ALPHA,
            },
            spatial: SpatialCfg {
                max_merge_dist: Self::DEFAULT_MAX_MERGE_DIST,
                closed_curve_max_dist: Self::DEFAULT_SPATIAL_CLOSED_CURVE_MAX_DIST,
                simplification_min_dist: Self::DEFAULT_SIMPLIFICATION_MIN_DIST,
                min_num_points: Self::DEFAULT_MIN_NUM_POINTS,
                stat_removal: StatRemovalCfg {
                    enable: false,
                    mean_k: Self::DEFAULT_STAT_MEAN_K,
                    stddev_mult: Self::DEFAULT_STAT_STDDEV_MULT,
                },
                normal_est: NormalEstimationCfg {
                    downsampling_radius: Self::DEFAULT_NORMAL_DOWNSAMPLING_RADIUS,
                    search_radius: Self::DEFAULT_NORMAL_SEARCH_RADIUS,
                    viewpoint: Self::DEFAULT_VIEWPOINT,
                    kdtree_epsilon: Self::DEFAULT_KDTREE_EPSILON,
                },
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contour_points_round_trip() {
        let contour = vec![PixelPoint::new(3, 7), PixelPoint::new(4, 7)];
        let points = contour_to_points(&contour);
        assert_eq!(points[0], Point3::new(3.0, 7.0, 0.0));
        assert_eq!(points_to_contour(&points), contour);
    }

    #[test]
    fn points_to_contour_truncates_toward_zero() {
        let points = vec![Point3::new(3.9, 7.2, 0.0)];
        assert_eq!(points_to_contour(&points), vec![PixelPoint::new(3, 7)]);
    }

    #[test]
    fn organized_cloud_rejects_wrong_buffer_length() {
        assert!(OrganizedCloud::new(4, 4, vec![Point3::origin(); 15]).is_none());
        assert!(OrganizedCloud::new(4, 4, vec![Point3::origin(); 16]).is_some());
    }

    #[test]
    fn organized_cloud_indexes_row_major() {
        let cloud = OrganizedCloud::from_fn(3, 2, |x, y| {
            Point3::new(x as f32, y as f32, 0.0)
        });
        assert_eq!(cloud.at(2, 1), Point3::new(2.0, 1.0, 0.0));
        assert_eq!(cloud.at(0, 0), Point3::origin());
    }

    #[test]
    fn single_row_cloud_is_not_organized() {
        let flat = OrganizedCloud::new(6, 1, vec![Point3::origin(); 6]).unwrap();
        assert!(!flat.is_organized());
        let grid = OrganizedCloud::new(3, 2, vec![Point3::origin(); 6]).unwrap();
        assert!(grid.is_organized());
    }

    #[test]
    fn transformed_preserves_nan_samples() {
        let nan = Point3::new(f32::NAN, f32::NAN, f32::NAN);
        let cloud = OrganizedCloud::from_fn(2, 2, |x, _| {
            if x == 0 { nan } else { Point3::new(1.0, 0.0, 0.0) }
        });
        let iso = Isometry3::translation(5.0, 0.0, 0.0);
        let moved = cloud.transformed(&iso);
        assert!(moved.at(0, 0).x.is_nan());
        assert_eq!(moved.at(1, 0), Point3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn pose_axes_are_rotation_columns() {
        let x = Vector3::x();
        let y = Vector3::y();
        let z = Vector3::z();
        let pose = Pose::from_axes(Point3::new(1.0, 2.0, 3.0), x, y, z);
        assert_eq!(pose.x_axis(), x);
        assert_eq!(pose.y_axis(), y);
        assert_eq!(pose.z_axis(), z);
        assert_eq!(pose.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn effective_aperture_is_clamped_up_to_three() {
        let canny = CannyCfg {
            enable: true,
            lower_threshold: 1.0,
            upper_threshold: 2.0,
            aperture_size: 0,
        };
        assert_eq!(canny.effective_aperture(), 3);
        let canny = CannyCfg { aperture_size: 2, ..canny };
        assert_eq!(canny.effective_aperture(), 5);
    }

    #[test]
    fn default_config_is_valid() {
        RegionDetectionConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_dilation_kernel() {
        let mut config = RegionDetectionConfig::default();
        config.image.dilation.enable = true;
        config.image.dilation.kernel_size = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, RegionError::InvalidConfig(ref s) if s.contains("kernel_size")),
            "expected InvalidConfig about kernel_size, got {err:?}",
        );

        // Disabled stages are not validated.
        config.image.dilation.enable = false;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_oversized_canny_aperture() {
        let mut config = RegionDetectionConfig::default();
        config.image.canny.enable = true;
        config.image.canny.aperture_size = 4; // effective aperture 9
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, RegionError::InvalidConfig(ref s) if s.contains("aperture")),
            "expected InvalidConfig about aperture, got {err:?}",
        );
    }

    #[test]
    fn validate_rejects_inverted_canny_thresholds() {
        let mut config = RegionDetectionConfig::default();
        config.image.canny.enable = true;
        config.image.canny.lower_threshold = 200.0;
        config.image.canny.upper_threshold = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_single_point_minimum() {
        let mut config = RegionDetectionConfig::default();
        config.spatial.min_num_points = 1;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, RegionError::InvalidConfig(ref s) if s.contains("min_num_points")),
            "expected InvalidConfig about min_num_points, got {err:?}",
        );
    }

    #[test]
    fn config_serde_round_trip() {
        let mut config = RegionDetectionConfig::default();
        config.image.invert_image = true;
        config.image.dilation.enable = true;
        config.image.dilation.kernel_size = 2;
        config.image.dilation.elem = DilationShape::Ellipse;
        config.image.threshold.kind = ThresholdKind::ToZeroInverted;
        config.image.contour.mode = ContourMode::Tree;
        config.image.contour.method = ContourMethod::Tc89KCos;
        config.pixel.downsampling_radius = 1.5;
        config.spatial.stat_removal.enable = true;
        config.spatial.normal_est.viewpoint = [0.5, -0.25, 4.0];

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RegionDetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn unknown_enum_value_fails_deserialization() {
        let err = serde_json::from_str::<DilationShape>("\"Hexagon\"").unwrap_err();
        assert!(err.to_string().contains("Hexagon"));
    }

    #[test]
    fn contract_error_messages() {
        assert_eq!(
            RegionError::CloudNotOrganized.to_string(),
            "Point Cloud not organized",
        );
        assert_eq!(RegionError::EmptyContour.to_string(), "Empty indices vector");
        assert_eq!(
            RegionError::IndexOutOfBounds { x: 100, y: 0, width: 100, height: 100 }.to_string(),
            "2D indices exceed point cloud size",
        );
        assert_eq!(
            RegionError::NoPointsNearCurve.to_string(),
            "Found no points near curve",
        );
    }
}
