//! Configuration for the enhancement pipeline
//!
//! All knobs consumed by the router, cost guard, stages, standardizer, and
//! output encoder live here. Structs are serde-compatible so services can
//! load them from JSON, and the builder validates ranges at `build()` time.

use crate::error::{EnhancementError, Result};
use serde::{Deserialize, Serialize};

/// Output format for the encoded result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG, lossy, quality-iterable
    #[default]
    Jpeg,
    /// PNG, lossless, encoded once
    Png,
    /// WebP (lossless in this build), encoded once
    WebP,
}

impl OutputFormat {
    /// File extension for this format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Whether the encoder accepts a quality setting for this format
    #[must_use]
    pub fn supports_quality(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = EnhancementError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(EnhancementError::invalid_config(format!(
                "Unsupported output format: {other}. Supported: jpeg, png, webp"
            ))),
        }
    }
}

/// Raw-metric thresholds used by the quality scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Laplacian variance at or above which sharpness scores 100
    pub blur_excellent: f64,
    /// Laplacian variance for the 70-point sharpness knee
    pub blur_acceptable: f64,
    /// Laplacian variance for the 40-point sharpness knee
    pub blur_poor: f64,
    /// Shorter dimension at or above which resolution scores 100
    pub resolution_excellent: u32,
    /// Shorter dimension for the 80-point resolution knee
    pub resolution_good: u32,
    /// Shorter dimension for the 60-point resolution knee
    pub resolution_acceptable: u32,
    /// Shorter dimension for the 40-point resolution knee
    pub resolution_poor: u32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            blur_excellent: 300.0,
            blur_acceptable: 100.0,
            blur_poor: 50.0,
            resolution_excellent: 1500,
            resolution_good: 1000,
            resolution_acceptable: 800,
            resolution_poor: 500,
        }
    }
}

/// Tunable strengths for the local processing stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementParams {
    /// Unsharp mask strength
    pub sharpen_strength: f32,
    /// Unsharp mask blur radius in pixels
    pub sharpen_radius: f32,
    /// Denoise filter strength
    pub denoise_strength: f32,
    /// CLAHE clip limit for the standalone contrast stage
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid size (tiles per axis)
    pub clahe_tile_size: u32,
    /// Local upscale factor
    pub upscale_factor: f32,
    /// Hard cap on either output dimension when upscaling locally
    pub max_upscale_dimension: u32,
    /// Saturation multiplier for the finishing stage
    pub saturation_boost: f32,
}

impl Default for EnhancementParams {
    fn default() -> Self {
        Self {
            sharpen_strength: 1.5,
            sharpen_radius: 1.0,
            denoise_strength: 10.0,
            clahe_clip_limit: 2.0,
            clahe_tile_size: 8,
            upscale_factor: 2.0,
            max_upscale_dimension: 4096,
            saturation_boost: 1.05,
        }
    }
}

/// Local-vs-remote routing thresholds and gates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Global switch for remote execution
    pub remote_enabled: bool,
    /// Allow remote background removal
    pub use_remote_background_removal: bool,
    /// Allow remote upscaling
    pub use_remote_upscaling: bool,
    /// Allow remote lighting correction
    pub use_remote_lighting: bool,
    /// Background complexity above which remote segmentation is preferred
    pub bg_complexity_threshold: f64,
    /// Shorter dimension below which remote upscaling is preferred
    pub low_res_threshold: u32,
    /// Blur score below which remote upscaling is preferred
    pub blur_threshold: f64,
    /// Lighting deviation above which remote lighting is preferred
    pub lighting_deviation_threshold: f64,
    /// Daily remote spend ceiling in USD
    pub max_daily_cost_usd: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            use_remote_background_removal: true,
            use_remote_upscaling: true,
            use_remote_lighting: true,
            bg_complexity_threshold: 0.4,
            low_res_threshold: 800,
            blur_threshold: 100.0,
            lighting_deviation_threshold: 40.0,
            max_daily_cost_usd: 10.0,
        }
    }
}

/// Canvas standardization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardizationSpec {
    /// Explicit canvas width; derived from input when absent
    pub target_width: Option<u32>,
    /// Explicit canvas height; derived from input when absent
    pub target_height: Option<u32>,
    /// Padding as a percent of the smaller canvas dimension
    pub padding_percent: f32,
    /// Canvas fill color (RGB)
    pub background_color: [u8; 3],
    /// Derived canvases are scaled up until the shorter side reaches this
    pub min_dimension: u32,
    /// Derived canvases are scaled down until the longer side fits this
    pub max_dimension: u32,
}

impl Default for StandardizationSpec {
    fn default() -> Self {
        Self {
            target_width: None,
            target_height: None,
            padding_percent: 5.0,
            background_color: [255, 255, 255],
            min_dimension: 1000,
            max_dimension: 2000,
        }
    }
}

/// Output encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Encoded output format
    pub format: OutputFormat,
    /// Initial JPEG quality
    pub jpeg_quality: u8,
    /// PNG compression level (0-9)
    pub png_compression: u8,
    /// WebP quality; retained for configs targeting lossy-capable encoders
    pub webp_quality: u8,
    /// Byte budget for the encoded output; no size loop when absent
    pub target_max_size_kb: Option<u32>,
    /// Quality floor for the size-constrained re-encode loop
    pub min_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            jpeg_quality: 92,
            png_compression: 6,
            webp_quality: 90,
            target_max_size_kb: Some(500),
            min_quality: 60,
        }
    }
}

/// Complete configuration for one enhancement pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Scoring thresholds
    pub thresholds: QualityThresholds,
    /// Stage strengths
    pub params: EnhancementParams,
    /// Routing gates and thresholds
    pub routing: RoutingConfig,
    /// Canvas standardization
    pub standardization: StandardizationSpec,
    /// Output encoding
    pub output: OutputConfig,
    /// Run the standardization pass at the end of stage execution
    pub standardize: bool,
    /// Timeout applied to each remote call, in seconds
    pub remote_timeout_secs: u64,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            thresholds: QualityThresholds::default(),
            params: EnhancementParams::default(),
            routing: RoutingConfig::default(),
            standardization: StandardizationSpec::default(),
            output: OutputConfig::default(),
            standardize: true,
            remote_timeout_secs: 30,
        }
    }
}

impl EnhancementConfig {
    /// Create a builder with default values
    #[must_use]
    pub fn builder() -> EnhancementConfigBuilder {
        EnhancementConfigBuilder::new()
    }

    /// Validate relational and range constraints
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidConfig` describing the first
    /// out-of-range parameter found.
    pub fn validate(&self) -> Result<()> {
        if self.output.jpeg_quality > 100 {
            return Err(EnhancementError::config_value_error(
                "jpeg_quality",
                self.output.jpeg_quality,
                "0-100",
                Some(92),
            ));
        }
        if self.output.webp_quality > 100 {
            return Err(EnhancementError::config_value_error(
                "webp_quality",
                self.output.webp_quality,
                "0-100",
                Some(90),
            ));
        }
        if self.output.png_compression > 9 {
            return Err(EnhancementError::config_value_error(
                "png_compression",
                self.output.png_compression,
                "0-9",
                Some(6),
            ));
        }
        if self.output.min_quality == 0 || self.output.min_quality > 90 {
            return Err(EnhancementError::config_value_error(
                "min_quality",
                self.output.min_quality,
                "1-90",
                Some(60),
            ));
        }
        if !(0.0..=1.0).contains(&self.routing.bg_complexity_threshold) {
            return Err(EnhancementError::config_value_error(
                "bg_complexity_threshold",
                self.routing.bg_complexity_threshold,
                "0.0-1.0",
                Some(0.4),
            ));
        }
        if self.routing.max_daily_cost_usd < 0.0 {
            return Err(EnhancementError::config_value_error(
                "max_daily_cost_usd",
                self.routing.max_daily_cost_usd,
                ">= 0.0",
                Some(10.0),
            ));
        }
        if self.params.upscale_factor < 1.0 {
            return Err(EnhancementError::config_value_error(
                "upscale_factor",
                self.params.upscale_factor,
                ">= 1.0",
                Some(2.0),
            ));
        }
        if self.params.clahe_tile_size == 0 {
            return Err(EnhancementError::config_value_error(
                "clahe_tile_size",
                self.params.clahe_tile_size,
                ">= 1",
                Some(8),
            ));
        }
        if !(0.0..=50.0).contains(&self.standardization.padding_percent) {
            return Err(EnhancementError::config_value_error(
                "padding_percent",
                self.standardization.padding_percent,
                "0.0-50.0",
                Some(5.0),
            ));
        }
        if self.standardization.min_dimension > self.standardization.max_dimension {
            return Err(EnhancementError::invalid_config(format!(
                "min_dimension ({}) must not exceed max_dimension ({})",
                self.standardization.min_dimension, self.standardization.max_dimension
            )));
        }
        if self.remote_timeout_secs == 0 {
            return Err(EnhancementError::config_value_error(
                "remote_timeout_secs",
                self.remote_timeout_secs,
                ">= 1",
                Some(30),
            ));
        }
        Ok(())
    }
}

/// Builder for [`EnhancementConfig`]
#[derive(Debug, Clone, Default)]
pub struct EnhancementConfigBuilder {
    config: EnhancementConfig,
}

impl EnhancementConfigBuilder {
    /// Create a builder seeded with defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EnhancementConfig::default(),
        }
    }

    /// Replace the scoring thresholds
    #[must_use]
    pub fn thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Replace the stage strengths
    #[must_use]
    pub fn params(mut self, params: EnhancementParams) -> Self {
        self.config.params = params;
        self
    }

    /// Replace the routing configuration
    #[must_use]
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.config.routing = routing;
        self
    }

    /// Replace the standardization spec
    #[must_use]
    pub fn standardization(mut self, spec: StandardizationSpec) -> Self {
        self.config.standardization = spec;
        self
    }

    /// Replace the output configuration
    #[must_use]
    pub fn output(mut self, output: OutputConfig) -> Self {
        self.config.output = output;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the initial JPEG quality (clamped to 100)
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.output.jpeg_quality = quality.min(100);
        self
    }

    /// Set the output byte budget in KB
    #[must_use]
    pub fn target_max_size_kb(mut self, kb: Option<u32>) -> Self {
        self.config.output.target_max_size_kb = kb;
        self
    }

    /// Set the quality floor for the size loop
    #[must_use]
    pub fn min_quality(mut self, quality: u8) -> Self {
        self.config.output.min_quality = quality;
        self
    }

    /// Enable or disable remote execution globally
    #[must_use]
    pub fn remote_enabled(mut self, enabled: bool) -> Self {
        self.config.routing.remote_enabled = enabled;
        self
    }

    /// Set the daily remote budget in USD
    #[must_use]
    pub fn daily_budget(mut self, usd: f64) -> Self {
        self.config.routing.max_daily_cost_usd = usd;
        self
    }

    /// Enable or disable the standardization pass
    #[must_use]
    pub fn standardize(mut self, enabled: bool) -> Self {
        self.config.standardize = enabled;
        self
    }

    /// Set the per-call remote timeout in seconds
    #[must_use]
    pub fn remote_timeout_secs(mut self, secs: u64) -> Self {
        self.config.remote_timeout_secs = secs;
        self
    }

    /// Validate and produce the configuration
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidConfig` when any parameter is out
    /// of range.
    pub fn build(self) -> Result<EnhancementConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
