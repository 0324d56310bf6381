//! Canvas standardization
//!
//! Marketplace listings expect consistent framing: the subject centered
//! on a clean canvas with breathing room around it. The canvas size is
//! either the configured explicit target or derived from the source
//! dimensions against the minimum and maximum bounds. The image is
//! fitted inside the padded content box with its aspect ratio intact,
//! and the alpha mask (when present) is carried through the same
//! transform so it stays registered with the pixels.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};

use crate::config::StandardizationSpec;
use crate::types::AlphaMask;

/// Place the image on a standardized canvas. Returns the canvas and the
/// mask transformed into canvas coordinates.
///
/// `preserve_resolution` skips the scale-up to the minimum dimension,
/// used after a remote upscale already chose the output resolution. The
/// maximum bound still applies. An explicit target requires both width
/// and height; a lone value falls back to derived sizing.
#[must_use]
pub fn standardize(
    image: &DynamicImage,
    mask: Option<&AlphaMask>,
    spec: &StandardizationSpec,
    preserve_resolution: bool,
) -> (DynamicImage, Option<AlphaMask>) {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return (image.clone(), mask.cloned());
    }

    let (canvas_w, canvas_h) = match (spec.target_width, spec.target_height) {
        (Some(tw), Some(th)) => (tw.max(1), th.max(1)),
        _ => derived_canvas(width, height, spec, preserve_resolution),
    };

    let padding = (f64::from(canvas_w.min(canvas_h)) * f64::from(spec.padding_percent) / 100.0)
        .round() as u32;
    let content_w = canvas_w.saturating_sub(2 * padding).max(1);
    let content_h = canvas_h.saturating_sub(2 * padding).max(1);

    let fitted = image.resize(content_w, content_h, FilterType::Triangle);
    let offset_x = i64::from((canvas_w - fitted.width()) / 2);
    let offset_y = i64::from((canvas_h - fitted.height()) / 2);

    let [r, g, b] = spec.background_color;
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([r, g, b, 255]));
    image::imageops::overlay(&mut canvas, &fitted, offset_x, offset_y);

    let canvas_mask = mask.and_then(|m| {
        let source = m.to_image()?;
        let resized = image::imageops::resize(
            &source,
            fitted.width(),
            fitted.height(),
            FilterType::Triangle,
        );
        let mut mask_canvas = GrayImage::new(canvas_w, canvas_h);
        image::imageops::replace(&mut mask_canvas, &resized, offset_x, offset_y);
        Some(AlphaMask::from_image(&mask_canvas))
    });

    log::debug!(
        "Standardized {}x{} -> {}x{} (padding {}px)",
        width,
        height,
        canvas_w,
        canvas_h,
        padding
    );
    (DynamicImage::ImageRgba8(canvas), canvas_mask)
}

/// Scale source dimensions into the [min, max] band, preserving aspect
fn derived_canvas(
    width: u32,
    height: u32,
    spec: &StandardizationSpec,
    preserve_resolution: bool,
) -> (u32, u32) {
    let mut scale = 1.0f64;
    let shorter = f64::from(width.min(height));
    let longer = f64::from(width.max(height));

    if !preserve_resolution && shorter < f64::from(spec.min_dimension) {
        scale = f64::from(spec.min_dimension) / shorter;
    }
    if longer * scale > f64::from(spec.max_dimension) {
        scale = f64::from(spec.max_dimension) / longer;
    }

    let canvas_w = ((f64::from(width) * scale).round() as u32).max(1);
    let canvas_h = ((f64::from(height) * scale).round() as u32).max(1);
    (canvas_w, canvas_h)
}
