//! Intensity thresholding with a configurable binary output value.
//!
//! Implemented as a per-pixel map rather than through
//! `imageproc::contrast::threshold` because the `max_binary_value`
//! output level is part of the configuration contract and the library
//! function hardcodes 255.

use image::Luma;

use crate::types::{GrayImage, ThresholdCfg, ThresholdKind};

/// Apply the configured threshold rule to every pixel.
#[must_use = "returns the thresholded image"]
pub fn apply(image: &GrayImage, cfg: &ThresholdCfg) -> GrayImage {
    let t = cfg.value;
    let max = cfg.max_binary_value;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        let out = match cfg.kind {
            ThresholdKind::Binary => {
                if v > t { max } else { 0 }
            }
            ThresholdKind::BinaryInverted => {
                if v > t { 0 } else { max }
            }
            ThresholdKind::Truncate => v.min(t),
            ThresholdKind::ToZero => {
                if v > t { v } else { 0 }
            }
            ThresholdKind::ToZeroInverted => {
                if v > t { 0 } else { v }
            }
        };
        Luma([out])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x5 ramp: 0, 64, 128, 192, 255.
    fn ramp() -> GrayImage {
        GrayImage::from_fn(5, 1, |x, _| Luma([match x {
            0 => 0,
            1 => 64,
            2 => 128,
            3 => 192,
            _ => 255,
        }]))
    }

    fn cfg(kind: ThresholdKind) -> ThresholdCfg {
        ThresholdCfg {
            enable: true,
            value: 128,
            kind,
            max_binary_value: 255,
        }
    }

    fn row(img: &GrayImage) -> Vec<u8> {
        (0..img.width()).map(|x| img.get_pixel(x, 0).0[0]).collect()
    }

    #[test]
    fn binary_rule() {
        let out = apply(&ramp(), &cfg(ThresholdKind::Binary));
        assert_eq!(row(&out), vec![0, 0, 0, 255, 255]);
    }

    #[test]
    fn binary_inverted_rule() {
        let out = apply(&ramp(), &cfg(ThresholdKind::BinaryInverted));
        assert_eq!(row(&out), vec![255, 255, 255, 0, 0]);
    }

    #[test]
    fn truncate_rule() {
        let out = apply(&ramp(), &cfg(ThresholdKind::Truncate));
        assert_eq!(row(&out), vec![0, 64, 128, 128, 128]);
    }

    #[test]
    fn to_zero_rule() {
        let out = apply(&ramp(), &cfg(ThresholdKind::ToZero));
        assert_eq!(row(&out), vec![0, 0, 0, 192, 255]);
    }

    #[test]
    fn to_zero_inverted_rule() {
        let out = apply(&ramp(), &cfg(ThresholdKind::ToZeroInverted));
        assert_eq!(row(&out), vec![0, 64, 128, 0, 0]);
    }

    #[test]
    fn custom_max_binary_value_is_used() {
        let custom = ThresholdCfg {
            max_binary_value: 100,
            ..cfg(ThresholdKind::Binary)
        };
        let out = apply(&ramp(), &custom);
        assert_eq!(row(&out), vec![0, 0, 0, 100, 100]);
    }
}
