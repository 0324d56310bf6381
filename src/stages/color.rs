//! Color balance and saturation adjustments

use image::DynamicImage;

/// Rec.601 luma from linear RGB bytes
#[inline]
pub(crate) fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Mean luma over the whole image in [0, 255]
#[must_use]
pub fn mean_luma(img: &DynamicImage) -> f64 {
    let buf = img.to_luma8();
    let pixels = buf.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    sum as f64 / pixels.len() as f64
}

/// Adjust saturation by mixing each pixel with its own luma:
/// `new = gray * (1 - s) + orig * s`.
#[must_use]
pub fn adjust_saturation(img: &DynamicImage, factor: f32) -> DynamicImage {
    if (factor - 1.0).abs() < f32::EPSILON {
        return img.clone();
    }
    let factor = factor.clamp(0.0, 2.5);
    let mut buf = img.to_rgba8();
    for px in buf.pixels_mut() {
        let [r, g, b, _] = px.0;
        let gray = luma(f32::from(r), f32::from(g), f32::from(b));
        for channel in px.0.iter_mut().take(3) {
            let mixed = gray * (1.0 - factor) + f32::from(*channel) * factor;
            *channel = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(buf)
}

/// Gray-world white balance, blended at `strength` in [0, 1].
///
/// Channel gains pull each channel mean toward the global mean; gains
/// are clamped to [0.8, 1.25] so a legitimately colorful subject is not
/// washed out.
#[must_use]
pub fn gray_world_balance(img: &DynamicImage, strength: f32) -> DynamicImage {
    if strength <= 0.0 {
        return img.clone();
    }
    let strength = strength.min(1.0);
    let buf = img.to_rgba8();
    let pixel_count = (u64::from(buf.width()) * u64::from(buf.height())).max(1);

    let mut sums = [0u64; 3];
    for px in buf.pixels() {
        sums[0] += u64::from(px.0[0]);
        sums[1] += u64::from(px.0[1]);
        sums[2] += u64::from(px.0[2]);
    }
    let means = [
        sums[0] as f32 / pixel_count as f32,
        sums[1] as f32 / pixel_count as f32,
        sums[2] as f32 / pixel_count as f32,
    ];
    let global = (means[0] + means[1] + means[2]) / 3.0;
    if global < 1.0 {
        return img.clone();
    }

    let gains = [
        (global / means[0].max(1.0)).clamp(0.8, 1.25),
        (global / means[1].max(1.0)).clamp(0.8, 1.25),
        (global / means[2].max(1.0)).clamp(0.8, 1.25),
    ];

    let mut out = buf;
    for px in out.pixels_mut() {
        for (channel, gain) in px.0.iter_mut().take(3).zip(gains.iter()) {
            let corrected = f32::from(*channel) * gain;
            let blended = f32::from(*channel) * (1.0 - strength) + corrected * strength;
            *channel = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(out)
}
