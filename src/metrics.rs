//! Image quality metric extraction
//!
//! Every routing and scoring decision in the pipeline starts from the
//! metrics computed here. Blur is the variance of a discrete Laplacian
//! response over the luma plane (higher = sharper); noise is the robust
//! sigma estimate median(|Laplacian|)/0.6745; background complexity blends
//! the edge-pixel ratio and luma spread inside a 15%-wide border frame,
//! since busy borders are what make automated segmentation unreliable.
//! Metrics are an immutable snapshot: the pipeline recomputes them after
//! enhancement rather than mutating the pre-enhancement values.

use crate::error::{EnhancementError, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Divisor converting a median absolute deviation into a sigma estimate
const ROBUST_SIGMA_DIVISOR: f64 = 0.6745;

/// Width of the border frame inspected for background complexity
const BORDER_FRACTION: f64 = 0.15;

/// Sobel magnitude above which a pixel counts as an edge for the
/// background-complexity ratio
const COMPLEXITY_EDGE_THRESHOLD: f64 = 100.0;

/// Sobel magnitude above which a pixel counts as an edge for the
/// whole-image edge density
const DENSITY_EDGE_THRESHOLD: f64 = 200.0;

/// Raw quality metrics for one decoded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Laplacian variance; higher means sharper
    pub blur_score: f64,
    /// Mean luma (0-255)
    pub brightness: f64,
    /// Luma standard deviation (0-255)
    pub contrast: f64,
    /// Robust noise sigma estimate
    pub noise: f64,
    /// Border busyness in [0, 1]
    pub background_complexity: f64,
    /// Fraction of strong-edge pixels over the whole frame
    pub edge_density: f64,
    /// |mean luma - 128|
    pub lighting_deviation: f64,
    /// Optional externally-computed perceptual score (lower is better)
    pub perceptual: Option<f64>,
}

impl QualityMetrics {
    /// Shorter image dimension in pixels
    #[must_use]
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Attach a perceptual score from an external estimator
    #[must_use]
    pub fn with_perceptual(mut self, score: f64) -> Self {
        self.perceptual = Some(score);
        self
    }
}

/// Extract all quality metrics from a decoded image.
///
/// # Errors
///
/// Returns `EnhancementError::InvalidInput` for an empty (zero-sized)
/// image.
pub fn analyze(image: &DynamicImage) -> Result<QualityMetrics> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EnhancementError::invalid_input(
            "cannot analyze an empty image",
        ));
    }

    let luma = luma_plane(image);
    let (w, h) = (width as usize, height as usize);
    let total = (w * h) as f64;

    // Mean and standard deviation of luma
    let sum: f64 = luma.iter().sum();
    let brightness = sum / total;
    let sq_sum: f64 = luma.iter().map(|v| (v - brightness) * (v - brightness)).sum();
    let contrast = (sq_sum / total).sqrt();

    // Laplacian responses over the interior; degenerate for images thinner
    // than the 3x3 kernel
    let mut responses: Vec<f64> = Vec::new();
    if w >= 3 && h >= 3 {
        responses.reserve((w - 2) * (h - 2));
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let response = luma[[y - 1, x]]
                    + luma[[y + 1, x]]
                    + luma[[y, x - 1]]
                    + luma[[y, x + 1]]
                    - 4.0 * luma[[y, x]];
                responses.push(response);
            }
        }
    }

    let (blur_score, noise) = if responses.is_empty() {
        (0.0, 0.0)
    } else {
        let n = responses.len() as f64;
        let mean = responses.iter().sum::<f64>() / n;
        let variance = responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
        let mut abs_responses: Vec<f64> = responses.iter().map(|r| r.abs()).collect();
        (variance, median(&mut abs_responses) / ROBUST_SIGMA_DIVISOR)
    };

    let edges = edge_statistics(&luma, w, h);
    let background_complexity = border_complexity(&luma, w, h, &edges.complexity_edges);

    Ok(QualityMetrics {
        width,
        height,
        blur_score,
        brightness,
        contrast,
        noise,
        background_complexity,
        edge_density: edges.density,
        lighting_deviation: (brightness - 128.0).abs(),
        perceptual: None,
    })
}

/// Laplacian variance of an image's luma plane.
///
/// Exposed separately so callers can gauge sharpness without the cost of a
/// full metric pass.
#[must_use]
pub fn laplacian_variance(image: &DynamicImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }
    let luma = luma_plane(image);
    let (w, h) = (width as usize, height as usize);
    let n = ((w - 2) * (h - 2)) as f64;

    let mut sum = 0.0;
    let mut sq_sum = 0.0;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let response = luma[[y - 1, x]]
                + luma[[y + 1, x]]
                + luma[[y, x - 1]]
                + luma[[y, x + 1]]
                - 4.0 * luma[[y, x]];
            sum += response;
            sq_sum += response * response;
        }
    }
    let mean = sum / n;
    sq_sum / n - mean * mean
}

fn luma_plane(image: &DynamicImage) -> Array2<f64> {
    let gray = image.to_luma8();
    let (w, h) = gray.dimensions();
    let mut arr = Array2::<f64>::zeros((h as usize, w as usize));
    for (x, y, pixel) in gray.enumerate_pixels() {
        arr[[y as usize, x as usize]] = f64::from(pixel[0]);
    }
    arr
}

struct EdgeStatistics {
    /// Boolean map of pixels whose Sobel magnitude clears the
    /// complexity threshold
    complexity_edges: Array2<bool>,
    /// Fraction of pixels clearing the density threshold
    density: f64,
}

fn edge_statistics(luma: &Array2<f64>, w: usize, h: usize) -> EdgeStatistics {
    let mut complexity_edges = Array2::from_elem((h, w), false);
    if w < 3 || h < 3 {
        return EdgeStatistics {
            complexity_edges,
            density: 0.0,
        };
    }

    let mut strong = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = luma[[y - 1, x + 1]] + 2.0 * luma[[y, x + 1]] + luma[[y + 1, x + 1]]
                - luma[[y - 1, x - 1]]
                - 2.0 * luma[[y, x - 1]]
                - luma[[y + 1, x - 1]];
            let gy = luma[[y + 1, x - 1]] + 2.0 * luma[[y + 1, x]] + luma[[y + 1, x + 1]]
                - luma[[y - 1, x - 1]]
                - 2.0 * luma[[y - 1, x]]
                - luma[[y - 1, x + 1]];
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude > COMPLEXITY_EDGE_THRESHOLD {
                complexity_edges[[y, x]] = true;
            }
            if magnitude > DENSITY_EDGE_THRESHOLD {
                strong += 1;
            }
        }
    }

    EdgeStatistics {
        complexity_edges,
        density: strong as f64 / (w * h) as f64,
    }
}

/// Blend of border edge ratio and border luma spread, scaled into [0, 1]
fn border_complexity(luma: &Array2<f64>, w: usize, h: usize, edges: &Array2<bool>) -> f64 {
    let border = ((w.min(h) as f64) * BORDER_FRACTION) as usize;
    if border == 0 {
        return 0.0;
    }

    let mut count = 0usize;
    let mut edge_count = 0usize;
    let mut sum = 0.0;
    let mut sq_sum = 0.0;
    for y in 0..h {
        for x in 0..w {
            let in_border = x < border || x >= w - border || y < border || y >= h - border;
            if !in_border {
                continue;
            }
            count += 1;
            if edges[[y, x]] {
                edge_count += 1;
            }
            let v = luma[[y, x]];
            sum += v;
            sq_sum += v * v;
        }
    }
    if count == 0 {
        return 0.0;
    }

    let n = count as f64;
    let mean = sum / n;
    let variance = (sq_sum / n - mean * mean).max(0.0);
    let edge_ratio = edge_count as f64 / n;
    let spread = variance.sqrt() / 255.0;

    ((0.5 * edge_ratio + 0.5 * spread) * 3.0).clamp(0.0, 1.0)
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([value, value, value, 255]),
        ))
    }

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(analyze(&img).is_err());
    }

    #[test]
    fn test_flat_image_metrics() {
        let metrics = analyze(&solid(64, 64, 128)).unwrap();
        assert!(metrics.blur_score < 1.0);
        assert!((metrics.brightness - 128.0).abs() < 1.0);
        assert!(metrics.contrast < 1.0);
        assert!(metrics.noise < 1.0);
        assert!(metrics.background_complexity < 0.05);
        assert!(metrics.edge_density < 0.01);
        assert!(metrics.lighting_deviation < 1.0);
    }

    #[test]
    fn test_checkerboard_is_sharp_and_busy() {
        let metrics = analyze(&checkerboard(64, 64)).unwrap();
        assert!(metrics.blur_score > 300.0);
        assert!(metrics.edge_density > 0.5);
        // Busy border drives complexity to the clamp
        assert!((metrics.background_complexity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lighting_deviation_tracks_brightness() {
        let dark = analyze(&solid(32, 32, 40)).unwrap();
        assert!((dark.lighting_deviation - 88.0).abs() < 1.0);

        let bright = analyze(&solid(32, 32, 220)).unwrap();
        assert!((bright.lighting_deviation - 92.0).abs() < 1.0);
    }

    #[test]
    fn test_clean_border_scores_low_complexity() {
        // Busy center, plain white border
        let mut img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        for y in 30..70 {
            for x in 30..70 {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }
        let metrics = analyze(&DynamicImage::ImageRgba8(img)).unwrap();
        assert!(metrics.background_complexity < 0.3);
        assert!(metrics.blur_score > 100.0);
    }

    #[test]
    fn test_laplacian_variance_ordering() {
        let sharp = laplacian_variance(&checkerboard(64, 64));
        let flat = laplacian_variance(&solid(64, 64, 128));
        assert!(sharp > flat);
        assert!(flat < 1.0);
    }

    #[test]
    fn test_tiny_image_degenerates_gracefully() {
        let metrics = analyze(&solid(2, 2, 90)).unwrap();
        assert!(metrics.blur_score.abs() < f64::EPSILON);
        assert!(metrics.noise.abs() < f64::EPSILON);
        assert!((metrics.brightness - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_min_dimension_and_perceptual() {
        let metrics = analyze(&solid(40, 20, 128)).unwrap();
        assert_eq!(metrics.min_dimension(), 20);
        assert!(metrics.perceptual.is_none());

        let metrics = metrics.with_perceptual(35.0);
        assert_eq!(metrics.perceptual, Some(35.0));
    }
}
