//! Grayscale conversion and optional inversion.
//!
//! First step of the 2D stage: the RGB input becomes a single-channel
//! image that the dilation / threshold / Canny stages operate on.

use crate::types::{GrayImage, RgbImage};

/// Convert an RGB image to grayscale.
///
/// Uses the `image` crate's standard luminance weighting.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Invert a grayscale image: every value v becomes 255 - v.
#[must_use = "returns the inverted image"]
pub fn invert(image: GrayImage) -> GrayImage {
    let mut inverted = image;
    image::imageops::invert(&mut inverted);
    inverted
}
