//! Morphological dilation of the grayscale image.
//!
//! Thickens bright features before thresholding so that thin or broken
//! region boundaries survive contour extraction. The structuring
//! element is a (2k+1) x (2k+1) shape anchored at its center, with the
//! shape selected by [`DilationShape`].

use imageproc::morphology::{grayscale_dilate, Mask};

use crate::types::{DilationCfg, DilationShape, GrayImage, RegionError};

/// Dilate the image with the configured structuring element.
///
/// # Errors
///
/// Returns [`RegionError::InvalidConfig`] when `kernel_size` is outside
/// [1, 255]; [`RegionDetectionConfig::validate`](crate::RegionDetectionConfig::validate)
/// rejects such configurations up front, so this only fires for
/// hand-built stage calls.
pub fn dilate(image: &GrayImage, cfg: &DilationCfg) -> Result<GrayImage, RegionError> {
    let radius = u8::try_from(cfg.kernel_size)
        .ok()
        .filter(|&r| r > 0)
        .ok_or_else(|| RegionError::InvalidConfig("invalid dilation size".to_owned()))?;

    let mask = match cfg.elem {
        DilationShape::Rect => Mask::square(radius),
        DilationShape::Cross => Mask::diamond(radius),
        DilationShape::Ellipse => Mask::disk(radius),
    };
    Ok(grayscale_dilate(image, &mask))
}
