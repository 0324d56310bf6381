//! Unsharp-mask sharpening
//!
//! The plain variant applies `orig + strength * (orig - blurred)` across
//! the frame. The edge-weighted variant scales that delta by a softened
//! Sobel magnitude so smooth regions (and any noise in them) are left
//! alone while real edges crispen.

use image::{DynamicImage, GrayImage, RgbaImage};

/// Unsharp mask over the whole frame.
#[must_use]
pub fn sharpen(img: &DynamicImage, strength: f32, radius: f32) -> DynamicImage {
    if strength <= 0.0 {
        return img.clone();
    }
    let strength = strength.min(5.0);
    let buf = img.to_rgba8();
    let blurred = image::imageops::blur(&buf, radius.max(0.1));
    let mut out = buf.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let b = blurred.get_pixel(x, y).0;
        for c in 0..3 {
            let orig = f32::from(px.0[c]);
            let delta = orig - f32::from(b[c]);
            px.0[c] = (orig + strength * delta).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(out)
}

/// Unsharp mask weighted by local edge strength.
#[must_use]
pub fn sharpen_edges(img: &DynamicImage, strength: f32, radius: f32) -> DynamicImage {
    if strength <= 0.0 {
        return img.clone();
    }
    let strength = strength.min(5.0);
    let buf = img.to_rgba8();
    let (width, height) = buf.dimensions();
    if width < 3 || height < 3 {
        return img.clone();
    }

    let weights = match edge_weights(&img.to_luma8()) {
        Some(w) => w,
        None => return img.clone(),
    };

    let blurred = image::imageops::blur(&buf, radius.max(0.1));
    let mut out: RgbaImage = buf.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let weight = weights.get_pixel(x, y).0[0] as f32 / 255.0;
        if weight <= 0.0 {
            continue;
        }
        let b = blurred.get_pixel(x, y).0;
        for c in 0..3 {
            let orig = f32::from(px.0[c]);
            let delta = orig - f32::from(b[c]);
            px.0[c] = (orig + strength * weight * delta).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(out)
}

/// Softened, normalized Sobel magnitude. `None` when the frame has no
/// gradient at all.
fn edge_weights(luma: &GrayImage) -> Option<GrayImage> {
    let (width, height) = luma.dimensions();
    let mut magnitude = vec![0.0f32; (width * height) as usize];
    let mut max_mag = 0.0f32;

    let at = |x: u32, y: u32| -> f32 { f32::from(luma.get_pixel(x, y).0[0]) };
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = -at(x - 1, y - 1) + at(x + 1, y - 1) - 2.0 * at(x - 1, y)
                + 2.0 * at(x + 1, y)
                - at(x - 1, y + 1)
                + at(x + 1, y + 1);
            let gy = -at(x - 1, y - 1) - 2.0 * at(x, y - 1) - at(x + 1, y - 1)
                + at(x - 1, y + 1)
                + 2.0 * at(x, y + 1)
                + at(x + 1, y + 1);
            let mag = (gx * gx + gy * gy).sqrt();
            magnitude[(y * width + x) as usize] = mag;
            if mag > max_mag {
                max_mag = mag;
            }
        }
    }
    if max_mag < 1.0 {
        return None;
    }

    let map = GrayImage::from_fn(width, height, |x, y| {
        let m = magnitude[(y * width + x) as usize] / max_mag;
        image::Luma([(m * 255.0).round().clamp(0.0, 255.0) as u8])
    });
    // Soften so the weight falls off gradually around edges
    Some(image::imageops::blur(&map, 1.0))
}
