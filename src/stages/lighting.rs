//! Exposure correction and local contrast enhancement
//!
//! Lighting correction runs three passes: a global exposure shift when
//! mean luma sits outside the acceptable band, a gentle CLAHE blend for
//! local contrast, and a gray-world pass to neutralize color casts.
//! The standalone contrast stage reuses the CLAHE core at full strength.

use image::{DynamicImage, GrayImage};

use crate::config::EnhancementParams;
use crate::stages::color;

/// Mean luma below this triggers brightening
const DARK_LUMA: f64 = 80.0;
/// Mean luma above this triggers dimming
const BRIGHT_LUMA: f64 = 180.0;
/// Largest global exposure shift applied in one pass
const MAX_SHIFT: f64 = 50.0;
/// Clip limit for the CLAHE pass inside lighting correction
const LIGHTING_CLAHE_CLIP: f32 = 1.5;
/// Blend fraction of the CLAHE result inside lighting correction
const LIGHTING_CLAHE_BLEND: f32 = 0.25;
/// Blend fraction of the gray-world pass inside lighting correction
const LIGHTING_BALANCE_BLEND: f32 = 0.30;

/// Full lighting correction: exposure shift, local contrast, color balance.
#[must_use]
pub fn correct_lighting(img: &DynamicImage, params: &EnhancementParams) -> DynamicImage {
    let mean = color::mean_luma(img);

    let shifted = if mean < DARK_LUMA {
        let delta = ((128.0 - mean) * 0.5).min(MAX_SHIFT) as i32;
        DynamicImage::ImageRgba8(image::imageops::brighten(&img.to_rgba8(), delta))
    } else if mean > BRIGHT_LUMA {
        let delta = ((mean - 128.0) * 0.5).min(MAX_SHIFT) as i32;
        DynamicImage::ImageRgba8(image::imageops::brighten(&img.to_rgba8(), -delta))
    } else {
        img.clone()
    };

    let contrasted = apply_clahe(
        &shifted,
        LIGHTING_CLAHE_CLIP,
        params.clahe_tile_size,
        LIGHTING_CLAHE_BLEND,
    );

    color::gray_world_balance(&contrasted, LIGHTING_BALANCE_BLEND)
}

/// Standalone local contrast enhancement at the configured clip limit.
#[must_use]
pub fn enhance_contrast(img: &DynamicImage, params: &EnhancementParams) -> DynamicImage {
    apply_clahe(img, params.clahe_clip_limit, params.clahe_tile_size, 1.0)
}

/// Run CLAHE on the luma plane and rescale RGB by the luma ratio,
/// blending the result at `blend` in [0, 1].
fn apply_clahe(img: &DynamicImage, clip_limit: f32, grid: u32, blend: f32) -> DynamicImage {
    if blend <= 0.0 {
        return img.clone();
    }
    let before = img.to_luma8();
    if before.width() == 0 || before.height() == 0 {
        return img.clone();
    }
    let after = clahe_luma(&before, clip_limit, grid);
    scale_rgb_by_luma(img, &before, &after, blend.min(1.0))
}

/// Contrast-limited adaptive histogram equalization over a tile grid.
///
/// Each tile gets a clipped-histogram LUT; pixels interpolate bilinearly
/// between the four nearest tile LUTs so tile seams stay invisible.
fn clahe_luma(luma: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = luma.dimensions();
    let grid = grid.clamp(1, 16).min(width).min(height).max(1);
    let tile_w = (width + grid - 1) / grid;
    let tile_h = (height + grid - 1) / grid;

    // One LUT per tile
    let mut luts: Vec<[f32; 256]> = Vec::with_capacity((grid * grid) as usize);
    for ty in 0..grid {
        for tx in 0..grid {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[luma.get_pixel(x, y).0[0] as usize] += 1;
                    count += 1;
                }
            }
            luts.push(build_clipped_lut(&hist, count, clip_limit));
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        // Tile-space coordinate of this row, centered on tile midpoints
        let gy = (f64::from(y) + 0.5) / f64::from(tile_h) - 0.5;
        let ty0 = gy.floor().clamp(0.0, f64::from(grid - 1)) as u32;
        let ty1 = (ty0 + 1).min(grid - 1);
        let wy = (gy - f64::from(ty0)).clamp(0.0, 1.0) as f32;

        for x in 0..width {
            let gx = (f64::from(x) + 0.5) / f64::from(tile_w) - 0.5;
            let tx0 = gx.floor().clamp(0.0, f64::from(grid - 1)) as u32;
            let tx1 = (tx0 + 1).min(grid - 1);
            let wx = (gx - f64::from(tx0)).clamp(0.0, 1.0) as f32;

            let v = luma.get_pixel(x, y).0[0] as usize;
            let top = luts[(ty0 * grid + tx0) as usize][v] * (1.0 - wx)
                + luts[(ty0 * grid + tx1) as usize][v] * wx;
            let bottom = luts[(ty1 * grid + tx0) as usize][v] * (1.0 - wx)
                + luts[(ty1 * grid + tx1) as usize][v] * wx;
            let mapped = top * (1.0 - wy) + bottom * wy;
            out.put_pixel(x, y, image::Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Histogram clipping with uniform redistribution, then CDF mapping
fn build_clipped_lut(hist: &[u32; 256], count: u32, clip_limit: f32) -> [f32; 256] {
    let mut lut = [0.0f32; 256];
    if count == 0 {
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = i as f32;
        }
        return lut;
    }

    let limit = ((clip_limit * count as f32 / 256.0) as u32).max(1);
    let mut clipped = [0u32; 256];
    let mut excess = 0u32;
    for i in 0..256 {
        if hist[i] > limit {
            excess += hist[i] - limit;
            clipped[i] = limit;
        } else {
            clipped[i] = hist[i];
        }
    }
    let per_bin = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, slot) in clipped.iter_mut().enumerate() {
        *slot += per_bin;
        if i < remainder {
            *slot += 1;
        }
    }

    let mut cumulative = 0u32;
    for i in 0..256 {
        cumulative += clipped[i];
        lut[i] = cumulative as f32 / count as f32 * 255.0;
    }
    lut
}

/// Multiply RGB by the per-pixel luma ratio `new / old`, with the new
/// luma blended at `blend`.
fn scale_rgb_by_luma(
    img: &DynamicImage,
    old: &GrayImage,
    new: &GrayImage,
    blend: f32,
) -> DynamicImage {
    let mut buf = img.to_rgba8();
    for (x, y, px) in buf.enumerate_pixels_mut() {
        let l_old = f32::from(old.get_pixel(x, y).0[0]).max(1.0);
        let l_new = f32::from(new.get_pixel(x, y).0[0]);
        let blended = l_old * (1.0 - blend) + l_new * blend;
        let ratio = blended / l_old;
        for channel in px.0.iter_mut().take(3) {
            *channel = (f32::from(*channel) * ratio).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(buf)
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

    fn horizontal_gradient(lo: u8, hi: u8, size: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(size, size, |x, _| {
            let t = x as f32 / (size - 1) as f32;
            let v = (f32::from(lo) + t * f32::from(hi - lo)).round() as u8;
            Rgba([v, v, v, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn luma_std(img: &DynamicImage) -> f64 {
        let buf = img.to_luma8();
        let n = buf.as_raw().len() as f64;
        let mean = buf.as_raw().iter().map(|&p| f64::from(p)).sum::<f64>() / n;
        let var = buf
            .as_raw()
            .iter()
            .map(|&p| (f64::from(p) - mean).powi(2))
            .sum::<f64>()
            / n;
        var.sqrt()
    }

    #[test]
    fn test_dark_image_is_brightened() {
        let params = EnhancementParams::default();
        let before = solid(40, 32);
        let after = correct_lighting(&before, &params);
        assert!(color::mean_luma(&after) > color::mean_luma(&before) + 20.0);
    }

    #[test]
    fn test_bright_image_is_dimmed() {
        let params = EnhancementParams::default();
        let before = solid(230, 32);
        let after = correct_lighting(&before, &params);
        assert!(color::mean_luma(&after) < color::mean_luma(&before) - 20.0);
    }

    #[test]
    fn test_wellexposed_image_changes_little() {
        let params = EnhancementParams::default();
        let before = solid(130, 32);
        let after = correct_lighting(&before, &params);
        assert!((color::mean_luma(&after) - 130.0).abs() < 12.0);
    }

    #[test]
    fn test_contrast_enhancement_widens_gradient() {
        let params = EnhancementParams::default();
        let before = horizontal_gradient(100, 140, 64);
        let after = enhance_contrast(&before, &params);
        assert!(luma_std(&after) > luma_std(&before));
        assert_eq!(after.width(), before.width());
        assert_eq!(after.height(), before.height());
    }

    #[test]
    fn test_clahe_near_identity_on_flat_image() {
        let params = EnhancementParams::default();
        let before = solid(130, 64);
        let after = enhance_contrast(&before, &params);
        let px = after.to_rgba8().get_pixel(32, 32).0;
        // Clipping redistributes the single spike, so a flat image maps
        // close to itself rather than to white
        assert!((i32::from(px[0]) - 130).abs() < 12);
    }

    #[test]
    fn test_tiny_image_does_not_panic() {
        let params = EnhancementParams::default();
        let before = solid(90, 2);
        let after = correct_lighting(&before, &params);
        assert_eq!(after.width(), 2);
    }
}
