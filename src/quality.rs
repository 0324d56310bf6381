//! Quality scoring and reporting
//!
//! Raw metrics map to 0-100 sub-scores through piecewise-linear curves,
//! then blend into one composite score and a discrete tier. The same
//! curves run before and after enhancement so a quality delta is a
//! same-scale subtraction. The report layer adds human-readable issues
//! and recommendations for listing-review surfaces.

use crate::config::QualityThresholds;
use crate::metrics::QualityMetrics;
use serde::{Deserialize, Serialize};

/// Composite weightings for the four sub-scores
const WEIGHT_SHARPNESS: f64 = 0.35;
const WEIGHT_BRIGHTNESS: f64 = 0.15;
const WEIGHT_CONTRAST: f64 = 0.20;
const WEIGHT_RESOLUTION: f64 = 0.30;

/// Mean luma considered ideal for product photos
const OPTIMAL_BRIGHTNESS: f64 = 130.0;

/// Blend ratio applied when a perceptual score is present
const PERCEPTUAL_BLEND: f64 = 0.30;

/// Discrete quality tier derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Composite below 20
    VeryPoor,
    /// Composite in [20, 40)
    Poor,
    /// Composite in [40, 60)
    Acceptable,
    /// Composite in [60, 80)
    Good,
    /// Composite at or above 80
    Excellent,
}

impl QualityTier {
    /// Map a composite score onto its tier
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Acceptable
        } else if score >= 20.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::Poor => write!(f, "poor"),
            Self::VeryPoor => write!(f, "very_poor"),
        }
    }
}

/// Normalized 0-100 quality scores for one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// Sharpness sub-score from the blur metric
    pub sharpness: f64,
    /// Brightness sub-score from mean luma
    pub brightness: f64,
    /// Contrast sub-score from luma spread
    pub contrast: f64,
    /// Resolution sub-score from the shorter dimension
    pub resolution: f64,
    /// Perceptual score carried through when present
    pub perceptual: Option<f64>,
    /// Weighted composite in [0, 100]
    pub overall: f64,
    /// Discrete tier from the composite
    pub tier: QualityTier,
}

/// One detected quality problem with its suggested remedy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    /// What is wrong
    pub description: String,
    /// What to do about it
    pub recommendation: String,
}

/// Full quality report for callers that want before/after comparison or
/// listing-review detail without running enhancement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Raw metrics the scores derive from
    pub metrics: QualityMetrics,
    /// Normalized scores and tier
    pub score: QualityScore,
    /// Detected problems, possibly empty
    pub issues: Vec<QualityIssue>,
    /// Whether this image would benefit from the pipeline
    pub needs_enhancement: bool,
}

/// Score raw metrics into normalized sub-scores, a composite, and a tier.
#[must_use]
pub fn score(metrics: &QualityMetrics, thresholds: &QualityThresholds) -> QualityScore {
    let sharpness = sharpness_score(metrics.blur_score, thresholds);
    let brightness = brightness_score(metrics.brightness);
    let contrast = contrast_score(metrics.contrast);
    let resolution = resolution_score(f64::from(metrics.min_dimension()), thresholds);

    let weighted = WEIGHT_SHARPNESS * sharpness
        + WEIGHT_BRIGHTNESS * brightness
        + WEIGHT_CONTRAST * contrast
        + WEIGHT_RESOLUTION * resolution;

    let overall = match metrics.perceptual {
        Some(p) => {
            // Perceptual estimators report distortion: lower is better
            let perceptual_component = (1.0 - p / 100.0).max(0.0) * 100.0;
            weighted * (1.0 - PERCEPTUAL_BLEND) + perceptual_component * PERCEPTUAL_BLEND
        },
        None => weighted,
    }
    .clamp(0.0, 100.0);

    QualityScore {
        sharpness,
        brightness,
        contrast,
        resolution,
        perceptual: metrics.perceptual,
        overall,
        tier: QualityTier::from_score(overall),
    }
}

/// Produce the full report: scores plus issues and recommendations.
///
/// `encoded_size` is the original payload size when known; oversized files
/// yield a compression recommendation.
#[must_use]
pub fn report(
    metrics: &QualityMetrics,
    thresholds: &QualityThresholds,
    encoded_size: Option<u64>,
) -> QualityReport {
    let score = score(metrics, thresholds);
    let mut issues = Vec::new();

    if score.sharpness < 50.0 {
        issues.push(QualityIssue {
            description: "image is blurry".into(),
            recommendation: "re-shoot with better focus or route through upscaling".into(),
        });
    } else if score.sharpness < 70.0 {
        issues.push(QualityIssue {
            description: "image could be sharper".into(),
            recommendation: "apply a sharpening pass".into(),
        });
    }

    if score.brightness < 50.0 {
        if metrics.brightness < 100.0 {
            issues.push(QualityIssue {
                description: "image is too dark".into(),
                recommendation: "apply lighting correction".into(),
            });
        } else {
            issues.push(QualityIssue {
                description: "image is overexposed".into(),
                recommendation: "reduce exposure or apply lighting correction".into(),
            });
        }
    }

    if score.contrast < 50.0 {
        issues.push(QualityIssue {
            description: "image has low contrast".into(),
            recommendation: "apply local contrast enhancement".into(),
        });
    }

    if score.resolution < 60.0 {
        issues.push(QualityIssue {
            description: "resolution is below listing standards".into(),
            recommendation: "upscale the image".into(),
        });
    }

    if metrics.noise > 20.0 {
        issues.push(QualityIssue {
            description: "image has visible noise".into(),
            recommendation: "apply denoising".into(),
        });
    }

    if let Some(bytes) = encoded_size {
        if bytes > 1_048_576 {
            issues.push(QualityIssue {
                description: "encoded file is large".into(),
                recommendation: "re-encode with a size target".into(),
            });
        }
    }

    let needs_enhancement = !issues.is_empty() || score.overall < 70.0;

    QualityReport {
        metrics: metrics.clone(),
        score,
        issues,
        needs_enhancement,
    }
}

fn sharpness_score(blur: f64, t: &QualityThresholds) -> f64 {
    if blur >= t.blur_excellent {
        100.0
    } else if blur >= t.blur_acceptable {
        70.0 + (blur - t.blur_acceptable) / (t.blur_excellent - t.blur_acceptable) * 30.0
    } else if blur >= t.blur_poor {
        40.0 + (blur - t.blur_poor) / (t.blur_acceptable - t.blur_poor) * 30.0
    } else {
        (blur / t.blur_poor).max(0.0) * 40.0
    }
}

fn brightness_score(brightness: f64) -> f64 {
    let deviation = (brightness - OPTIMAL_BRIGHTNESS).abs();
    if deviation < 20.0 {
        100.0
    } else if deviation < 50.0 {
        100.0 - (deviation - 20.0)
    } else if deviation < 80.0 {
        70.0 - (deviation - 50.0) * 0.5
    } else {
        (55.0 - (deviation - 80.0) * 0.5).max(0.0)
    }
}

fn contrast_score(contrast: f64) -> f64 {
    if contrast >= 60.0 {
        100.0
    } else if contrast >= 40.0 {
        70.0 + (contrast - 40.0) / 20.0 * 30.0
    } else if contrast >= 25.0 {
        50.0 + (contrast - 25.0) / 15.0 * 20.0
    } else {
        (contrast / 25.0).max(0.0) * 50.0
    }
}

fn resolution_score(min_dim: f64, t: &QualityThresholds) -> f64 {
    let excellent = f64::from(t.resolution_excellent);
    let good = f64::from(t.resolution_good);
    let acceptable = f64::from(t.resolution_acceptable);
    let poor = f64::from(t.resolution_poor);

    if min_dim >= excellent {
        100.0
    } else if min_dim >= good {
        80.0 + (min_dim - good) / (excellent - good) * 20.0
    } else if min_dim >= acceptable {
        60.0 + (min_dim - acceptable) / (good - acceptable) * 20.0
    } else if min_dim >= poor {
        40.0 + (min_dim - poor) / (acceptable - poor) * 20.0
    } else {
        (min_dim / poor).max(0.0) * 40.0
    }
}
