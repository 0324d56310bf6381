//! Border-statistics background removal
//!
//! Product photos against seamless backdrops are segmented without a
//! model: the border frame estimates the backdrop color, pixels are
//! classified by color distance from that estimate, and morphology plus
//! a feathering blur turn the binary classification into a soft alpha
//! mask. When the classification degenerates (everything foreground or
//! everything background) the stage reports failure so the caller can
//! keep the original image.

use image::{DynamicImage, GrayImage, Luma};

use crate::error::{EnhancementError, Result};
use crate::types::AlphaMask;

/// Border frame thickness as a fraction of the shorter side
const BORDER_MARGIN_FRACTION: f64 = 0.02;
/// Color distance multiplier over the pooled border deviation
const DISTANCE_SIGMA: f64 = 2.5;
/// Floor for the pooled deviation so near-uniform backdrops still
/// tolerate sensor noise
const MIN_SIGMA: f64 = 10.0;
/// Feathering blur applied to the binary mask
const FEATHER_SIGMA: f32 = 1.0;

/// Segment the subject and composite it over `fill`. Returns the
/// composited image and the soft alpha mask.
pub fn remove_background(
    img: &DynamicImage,
    fill: [u8; 3],
) -> Result<(DynamicImage, AlphaMask)> {
    let buf = img.to_rgba8();
    let (width, height) = buf.dimensions();
    if width < 8 || height < 8 {
        return Err(EnhancementError::processing_stage_error(
            "background_removal",
            "image too small to segment",
            Some(&format!("{width}x{height}, need at least 8x8")),
        ));
    }

    let margin = ((f64::from(width.min(height)) * BORDER_MARGIN_FRACTION).round() as u32).max(1);

    // Backdrop color statistics from the border frame
    let mut sums = [0.0f64; 3];
    let mut squares = [0.0f64; 3];
    let mut count = 0.0f64;
    for (x, y, px) in buf.enumerate_pixels() {
        if x < margin || x >= width - margin || y < margin || y >= height - margin {
            for c in 0..3 {
                let v = f64::from(px.0[c]);
                sums[c] += v;
                squares[c] += v * v;
            }
            count += 1.0;
        }
    }
    let mean = [sums[0] / count, sums[1] / count, sums[2] / count];
    let pooled_std = (0..3)
        .map(|c| (squares[c] / count - mean[c] * mean[c]).max(0.0).sqrt())
        .sum::<f64>()
        / 3.0;
    let sigma = pooled_std.max(MIN_SIGMA);
    let threshold_sq = (DISTANCE_SIGMA * sigma).powi(2);

    // Classify: far from the backdrop color means subject. The border
    // frame itself is always background.
    let mut binary = GrayImage::new(width, height);
    for (x, y, px) in buf.enumerate_pixels() {
        let inside =
            x >= margin && x < width - margin && y >= margin && y < height - margin;
        if !inside {
            continue;
        }
        let dist_sq: f64 = (0..3)
            .map(|c| (f64::from(px.0[c]) - mean[c]).powi(2))
            .sum();
        if dist_sq > threshold_sq {
            binary.put_pixel(x, y, Luma([255]));
        }
    }

    // Close twice to heal holes inside the subject, then open once to
    // drop isolated speckles
    let mut mask = binary;
    for _ in 0..2 {
        mask = erode3(&dilate3(&mask));
    }
    mask = dilate3(&erode3(&mask));

    let soft = image::imageops::blur(&mask, FEATHER_SIGMA);
    let alpha = AlphaMask::from_image(&soft);

    let coverage = alpha.coverage();
    if coverage < 0.01 {
        return Err(EnhancementError::processing_stage_error(
            "background_removal",
            "no foreground found, keeping original image",
            Some(&format!("coverage {coverage:.3}")),
        ));
    }
    if coverage > 0.98 {
        return Err(EnhancementError::processing_stage_error(
            "background_removal",
            "subject fills the frame, nothing to remove",
            Some(&format!("coverage {coverage:.3}")),
        ));
    }

    // Composite the subject over the fill color
    let mut out = buf;
    for (x, y, px) in out.enumerate_pixels_mut() {
        let weight = u32::from(soft.get_pixel(x, y).0[0]);
        for c in 0..3 {
            let fg = u32::from(px.0[c]);
            let bg = u32::from(fill[c]);
            px.0[c] = ((fg * weight + bg * (255 - weight) + 127) / 255) as u8;
        }
        px.0[3] = 255;
    }

    log::debug!(
        "Background removed locally: coverage {:.1}%, sigma {:.1}",
        coverage * 100.0,
        sigma
    );
    Ok((DynamicImage::ImageRgba8(out), alpha))
}

/// 3x3 maximum filter
fn dilate3(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut best = 0u8;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                let ny = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
                best = best.max(mask.get_pixel(nx, ny).0[0]);
            }
        }
        Luma([best])
    })
}

/// 3x3 minimum filter
fn erode3(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut worst = 255u8;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                let ny = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
                worst = worst.min(mask.get_pixel(nx, ny).0[0]);
            }
        }
        Luma([worst])
    })
}
