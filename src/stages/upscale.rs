//! Local resolution increase
//!
//! Lanczos resampling followed by a light unsharp pass to offset the
//! softness resampling introduces. The factor is capped so the longer
//! side never exceeds the configured maximum.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::stages::sharpen;

/// Strength of the post-resample sharpening pass
const POST_SHARPEN: f32 = 0.5;

/// Upscale by `factor`, capped at `max_dimension` on the longer side.
/// Factors at or below 1 return the image unchanged.
#[must_use]
pub fn upscale(img: &DynamicImage, factor: f64, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 || factor <= 1.0 {
        return img.clone();
    }

    let longest = f64::from(width.max(height));
    let allowed = f64::from(max_dimension.max(1)) / longest;
    let effective = factor.min(allowed);
    if effective <= 1.0 {
        log::debug!(
            "Upscale skipped: {}x{} already at or beyond the {}px cap",
            width,
            height,
            max_dimension
        );
        return img.clone();
    }

    let target_w = ((f64::from(width) * effective).round() as u32).max(1);
    let target_h = ((f64::from(height) * effective).round() as u32).max(1);
    let resized = img.resize_exact(target_w, target_h, FilterType::Lanczos3);
    sharpen::sharpen(&resized, POST_SHARPEN, 1.0)
}
