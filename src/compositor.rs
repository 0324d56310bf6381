//! Masked compositing of stage outputs
//!
//! After background removal, later stages should only affect the
//! subject. Each dimension-preserving stage output is blended back over
//! its input through the alpha mask: full weight takes the processed
//! pixel, zero weight keeps the original backdrop.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::types::AlphaMask;

/// Blend `processed` over `original` through `mask`.
///
/// Both images must share dimensions; if they do not (a stage resized),
/// the processed image is returned as-is. A mask of a different size is
/// resampled to fit first.
#[must_use]
pub fn blend_with_mask(
    original: &DynamicImage,
    processed: &DynamicImage,
    mask: &AlphaMask,
) -> DynamicImage {
    let (width, height) = (original.width(), original.height());
    if processed.width() != width || processed.height() != height {
        log::debug!(
            "Mask blend skipped: {}x{} processed vs {}x{} original",
            processed.width(),
            processed.height(),
            width,
            height
        );
        return processed.clone();
    }

    let mask = if mask.dimensions == (width, height) {
        mask.clone()
    } else {
        mask.resize(width, height, FilterType::Triangle)
    };

    let orig = original.to_rgba8();
    let mut out = processed.to_rgba8();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let weight = u32::from(mask.data[(y * width + x) as usize]);
        if weight == 255 {
            continue;
        }
        let o = orig.get_pixel(x, y).0;
        for c in 0..4 {
            let p = u32::from(px.0[c]);
            let v = (p * weight + u32::from(o[c]) * (255 - weight) + 127) / 255;
            px.0[c] = v as u8;
        }
    }
    DynamicImage::ImageRgba8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(level: u8, size: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            size,
            size,
            Rgba([level, level, level, 255]),
        ))
    }

    fn uniform_mask(weight: u8, size: u32) -> AlphaMask {
        AlphaMask::new(vec![weight; (size * size) as usize], (size, size))
    }

    #[test]
    fn test_zero_mask_keeps_original() {
        let out = blend_with_mask(&solid(10, 8), &solid(200, 8), &uniform_mask(0, 8));
        assert_eq!(out.to_rgba8().get_pixel(4, 4).0[0], 10);
    }

    #[test]
    fn test_full_mask_takes_processed() {
        let out = blend_with_mask(&solid(10, 8), &solid(200, 8), &uniform_mask(255, 8));
        assert_eq!(out.to_rgba8().get_pixel(4, 4).0[0], 200);
    }

    #[test]
    fn test_half_mask_blends_midway() {
        let out = blend_with_mask(&solid(0, 8), &solid(200, 8), &uniform_mask(128, 8));
        let v = i32::from(out.to_rgba8().get_pixel(4, 4).0[0]);
        assert!((v - 100).abs() <= 2, "blended value {v}");
    }

    #[test]
    fn test_undersized_mask_is_resampled() {
        let out = blend_with_mask(&solid(0, 16), &solid(200, 16), &uniform_mask(255, 8));
        assert_eq!(out.to_rgba8().get_pixel(8, 8).0[0], 200);
    }

    #[test]
    fn test_resized_processed_passes_through() {
        let out = blend_with_mask(&solid(0, 8), &solid(200, 16), &uniform_mask(0, 8));
        assert_eq!(out.width(), 16);
        assert_eq!(out.to_rgba8().get_pixel(8, 8).0[0], 200);
    }
}
