//! Non-local means noise reduction
//!
//! Pixel similarity is measured on luma patches, and the resulting
//! weights average the RGB channels jointly. This keeps chroma from
//! smearing while still letting one weight computation serve all three
//! channels.

use image::DynamicImage;
use ndarray::Array2;

/// Half-width of the search window (7x7)
const SEARCH_RADIUS: i64 = 3;
/// Half-width of the comparison patch (3x3)
const PATCH_RADIUS: i64 = 1;

/// Reduce noise with strength `h` (typical range 5-30). Zero or negative
/// strength returns the image unchanged.
#[must_use]
pub fn reduce_noise(img: &DynamicImage, strength: f64) -> DynamicImage {
    if strength <= 0.0 {
        return img.clone();
    }
    let buf = img.to_rgba8();
    let (width, height) = buf.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let luma_img = img.to_luma8();
    let mut luma = Array2::<f32>::zeros((height as usize, width as usize));
    for (x, y, px) in luma_img.enumerate_pixels() {
        luma[(y as usize, x as usize)] = f32::from(px.0[0]);
    }

    let h2 = (strength * strength).max(1.0) as f32;
    let w = i64::from(width);
    let h = i64::from(height);

    let mut out = buf.clone();
    for y in 0..h {
        for x in 0..w {
            let mut weight_sum = 0.0f32;
            let mut acc = [0.0f32; 3];

            for dy in -SEARCH_RADIUS..=SEARCH_RADIUS {
                for dx in -SEARCH_RADIUS..=SEARCH_RADIUS {
                    let qx = (x + dx).clamp(0, w - 1);
                    let qy = (y + dy).clamp(0, h - 1);

                    let d2 = patch_distance(&luma, x, y, qx, qy, w, h);
                    let weight = (-d2 / h2).exp();

                    let px = buf.get_pixel(qx as u32, qy as u32).0;
                    weight_sum += weight;
                    acc[0] += weight * f32::from(px[0]);
                    acc[1] += weight * f32::from(px[1]);
                    acc[2] += weight * f32::from(px[2]);
                }
            }

            let px = out.get_pixel_mut(x as u32, y as u32);
            if weight_sum > 0.0 {
                for c in 0..3 {
                    px.0[c] = (acc[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
    DynamicImage::ImageRgba8(out)
}

/// Mean squared luma difference between the patches centered at p and q
fn patch_distance(luma: &Array2<f32>, px: i64, py: i64, qx: i64, qy: i64, w: i64, h: i64) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0.0f32;
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            let ax = (px + dx).clamp(0, w - 1) as usize;
            let ay = (py + dy).clamp(0, h - 1) as usize;
            let bx = (qx + dx).clamp(0, w - 1) as usize;
            let by = (qy + dy).clamp(0, h - 1) as usize;
            let diff = luma[(ay, ax)] - luma[(by, bx)];
            sum += diff * diff;
            count += 1.0;
        }
    }
    sum / count
}
