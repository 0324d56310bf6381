//! Core types for enhancement operations

use crate::{config::OutputFormat, error::Result, quality::QualityScore, routing::RoutingDecision};
use image::{imageops, DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Soft foreground mask with one weight per pixel
///
/// Weights are stored as grayscale bytes; 0 is background, 255 is full
/// foreground. Downstream blending treats the byte value as an alpha in
/// [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaMask {
    /// Mask data as grayscale values (0-255)
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl AlphaMask {
    /// Create a new mask from raw bytes
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create a mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert the mask to a grayscale image
    ///
    /// Returns `None` if the stored data length does not match the stored
    /// dimensions.
    #[must_use]
    pub fn to_image(&self) -> Option<GrayImage> {
        let (width, height) = self.dimensions;
        GrayImage::from_raw(width, height, self.data.clone())
    }

    /// Foreground weight at a pixel in [0, 1]; 0.0 outside the mask bounds
    #[must_use]
    pub fn weight_at(&self, x: u32, y: u32) -> f32 {
        let (width, height) = self.dimensions;
        if x >= width || y >= height {
            return 0.0;
        }
        let idx = (y as usize) * (width as usize) + x as usize;
        self.data.get(idx).map_or(0.0, |&v| f32::from(v) / 255.0)
    }

    /// Resize the mask with the given filter
    #[must_use]
    pub fn resize(&self, width: u32, height: u32, filter: imageops::FilterType) -> Self {
        match self.to_image() {
            Some(img) => {
                let resized = imageops::resize(&img, width, height, filter);
                Self::from_image(&resized)
            },
            // Degenerate data; produce an empty mask of the requested size
            None => Self::new(
                vec![0; (width as usize) * (height as usize)],
                (width, height),
            ),
        }
    }

    /// Fraction of pixels that are majority-foreground (value > 127)
    #[must_use]
    pub fn coverage(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let fg = self.data.iter().filter(|&&v| v > 127).count();
        fg as f32 / self.data.len() as f32
    }

    /// Mean alpha over the whole mask in [0, 1]
    #[must_use]
    pub fn mean_alpha(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        (sum as f32 / self.data.len() as f32) / 255.0
    }
}

/// How a processing step was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMethod {
    /// CPU-bound transform in this process
    Local,
    /// Remote provider call
    Remote,
}

impl std::fmt::Display for StepMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Provenance record for one executed stage
///
/// Appended in execution order and never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStep {
    /// Stage name, e.g. "background_removal"
    pub stage: String,
    /// Execution method actually used
    pub method: StepMethod,
    /// Whether the stage completed
    pub success: bool,
    /// Wall-clock latency of the stage
    pub latency_ms: u64,
    /// Remote cost charged for this step (0.0 for local)
    pub cost_usd: f64,
    /// Free-text detail, e.g. "upscaling_fallback"
    pub detail: Option<String>,
}

impl ProcessingStep {
    /// Record a successful local step
    #[must_use]
    pub fn local<S: Into<String>>(stage: S, latency_ms: u64) -> Self {
        Self {
            stage: stage.into(),
            method: StepMethod::Local,
            success: true,
            latency_ms,
            cost_usd: 0.0,
            detail: None,
        }
    }

    /// Record a successful remote step
    #[must_use]
    pub fn remote<S: Into<String>>(stage: S, latency_ms: u64, cost_usd: f64) -> Self {
        Self {
            stage: stage.into(),
            method: StepMethod::Remote,
            success: true,
            latency_ms,
            cost_usd,
            detail: None,
        }
    }

    /// Record a failed step
    #[must_use]
    pub fn failed<S: Into<String>>(stage: S, method: StepMethod, detail: S) -> Self {
        Self {
            stage: stage.into(),
            method,
            success: false,
            latency_ms: 0,
            cost_usd: 0.0,
            detail: Some(detail.into()),
        }
    }

    /// Attach a detail string
    #[must_use]
    pub fn with_detail<S: Into<String>>(mut self, detail: S) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Encoded output produced by the size-constrained encoder
#[derive(Debug, Clone)]
pub struct EncodedOutput {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Format the bytes are encoded in
    pub format: OutputFormat,
    /// Final quality used for lossy formats
    pub quality: Option<u8>,
    /// Whether the configured byte target was met (true when no target set)
    pub size_target_met: bool,
}

impl EncodedOutput {
    /// Size of the encoded payload in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when no bytes were produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Wall-clock timing breakdown for one enhancement run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancementTimings {
    /// Metric extraction and scoring (before + after)
    pub analyze_ms: u64,
    /// All stage executions combined
    pub stages_ms: u64,
    /// Canvas standardization
    pub standardize_ms: u64,
    /// Output encoding (including the size-constrained loop)
    pub encode_ms: u64,
    /// End-to-end run time
    pub total_ms: u64,
}

/// Result of one enhancement run
///
/// Constructed once per run and immutable after return. When `success` is
/// false, `error` holds the failure message and `steps` retains whatever
/// completed before the failure.
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    /// Binary top-level outcome
    pub success: bool,
    /// The enhanced image (the last good state when `success` is false)
    pub image: DynamicImage,
    /// Foreground mask when background removal produced one
    pub mask: Option<AlphaMask>,
    /// Input dimensions before any processing
    pub original_dimensions: (u32, u32),
    /// Output dimensions after all processing
    pub enhanced_dimensions: (u32, u32),
    /// Encoded size of the input payload
    pub original_size_bytes: u64,
    /// Encoded output; `None` when the run failed before encoding
    pub output: Option<EncodedOutput>,
    /// Ordered provenance of every executed stage
    pub steps: Vec<ProcessingStep>,
    /// Routing decisions made for this run
    pub decisions: Vec<RoutingDecision>,
    /// Total remote spend charged to the cost ledger
    pub remote_cost_usd: f64,
    /// Whether any stage executed remotely
    pub remote_used: bool,
    /// Whether a background-removal stage completed
    pub background_removed: bool,
    /// Quality score before enhancement
    pub quality_before: Option<QualityScore>,
    /// Quality score after enhancement
    pub quality_after: Option<QualityScore>,
    /// Timing breakdown
    pub timings: EnhancementTimings,
    /// Failure message when `success` is false
    pub error: Option<String>,
}

impl EnhancementResult {
    /// Encoded output bytes, when the run reached encoding
    #[must_use]
    pub fn output_bytes(&self) -> Option<&[u8]> {
        self.output.as_ref().map(|o| o.bytes.as_slice())
    }

    /// Size of the encoded output in bytes (0 before encoding)
    #[must_use]
    pub fn enhanced_size_bytes(&self) -> u64 {
        self.output.as_ref().map_or(0, |o| o.bytes.len() as u64)
    }

    /// Whether the output byte target was met (true when no target was set)
    #[must_use]
    pub fn size_target_met(&self) -> bool {
        self.output.as_ref().map_or(true, |o| o.size_target_met)
    }

    /// Composite score delta (after minus before) when both scores exist
    #[must_use]
    pub fn quality_improvement(&self) -> Option<f64> {
        match (&self.quality_before, &self.quality_after) {
            (Some(before), Some(after)) => Some(after.overall - before.overall),
            _ => None,
        }
    }

    /// Write the encoded output to a file
    ///
    /// # Errors
    ///
    /// Returns an error when no encoded output exists or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            crate::error::EnhancementError::processing("no encoded output to save")
        })?;
        std::fs::write(path, &output.bytes)?;
        Ok(())
    }
}
