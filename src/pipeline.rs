//! Enhancement pipeline orchestration
//!
//! This module provides the main `EnhancementPipeline` that consolidates
//! analysis, routing, stage execution, canvas standardization, and output
//! encoding behind one entry point. The pipeline is used the same way for
//! single images and batch callers to ensure consistent behavior.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::DynamicImage;
use instant::Instant;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug as trace_debug, info as trace_info, instrument, span, Level};

use crate::compositor;
use crate::config::EnhancementConfig;
use crate::cost::{CostGuard, DailyCostGuard, UsageStats};
use crate::error::{EnhancementError, Result};
use crate::metrics::{self, QualityMetrics};
use crate::quality::{self, QualityReport};
use crate::remote::{RemoteEnhancer, RemoteOutcome, RemoteParams, RemoteRequest};
use crate::routing::{self, Operation};
use crate::services::{ImageIOService, OutputEncoder};
use crate::stages::{self, StageKind};
use crate::standardize;
use crate::types::{
    AlphaMask, EnhancementResult, EnhancementTimings, ProcessingStep, StepMethod,
};

/// High-level processing intent selecting which stages the planner schedules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementMode {
    /// Analyze first, then run only the stages the metrics call for
    #[default]
    Auto,
    /// Run the complete stage chain regardless of measured quality
    Full,
    /// Background removal only
    BackgroundRemove,
    /// Lighting correction only
    LightCorrection,
    /// Denoise followed by upscaling
    UpscaleDenoise,
    /// Sharpening only
    Sharpen,
    /// Noise reduction only
    Denoise,
    /// Upscaling only
    Upscale,
    /// No enhancement stages, canvas standardization and encoding only
    Standardize,
    /// No enhancement stages and no canvas, re-encoding only
    Optimize,
}

impl EnhancementMode {
    /// Stable label used in logs and serialized results
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Full => "full",
            Self::BackgroundRemove => "background_remove",
            Self::LightCorrection => "light_correction",
            Self::UpscaleDenoise => "upscale_denoise",
            Self::Sharpen => "sharpen",
            Self::Denoise => "denoise",
            Self::Upscale => "upscale",
            Self::Standardize => "standardize",
            Self::Optimize => "optimize",
        }
    }
}

impl std::fmt::Display for EnhancementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnhancementMode {
    type Err = EnhancementError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "full" => Ok(Self::Full),
            "background" | "background_remove" => Ok(Self::BackgroundRemove),
            "lighting" | "light_correction" => Ok(Self::LightCorrection),
            "upscale_denoise" => Ok(Self::UpscaleDenoise),
            "sharpen" => Ok(Self::Sharpen),
            "denoise" => Ok(Self::Denoise),
            "upscale" => Ok(Self::Upscale),
            "standardize" => Ok(Self::Standardize),
            "optimize" => Ok(Self::Optimize),
            other => Err(EnhancementError::invalid_input(format!(
                "unknown enhancement mode: {other}"
            ))),
        }
    }
}

/// Builder for [`EnhancementPipeline`] with validation at `build()`
pub struct EnhancementPipelineBuilder {
    config: EnhancementConfig,
    remote: Option<Arc<dyn RemoteEnhancer>>,
    cost_guard: Option<Arc<dyn CostGuard>>,
    cancel: Option<CancellationToken>,
}

impl EnhancementPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: EnhancementConfig::default(),
            remote: None,
            cost_guard: None,
            cancel: None,
        }
    }

    pub fn config(mut self, config: EnhancementConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a remote provider; without one every routed operation runs locally
    pub fn remote(mut self, remote: Arc<dyn RemoteEnhancer>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Replace the default daily ledger with a shared or custom guard
    pub fn cost_guard(mut self, guard: Arc<dyn CostGuard>) -> Self {
        self.cost_guard = Some(guard);
        self
    }

    /// Attach a token that aborts the run between stages when cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate the configuration and assemble the pipeline
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidConfig` when any configured value
    /// is outside its valid range.
    pub fn build(self) -> Result<EnhancementPipeline> {
        self.config.validate()?;
        let cost_guard = self
            .cost_guard
            .unwrap_or_else(|| Arc::new(DailyCostGuard::new(self.config.routing.max_daily_cost_usd)));
        Ok(EnhancementPipeline {
            config: self.config,
            remote: self.remote,
            cost_guard,
            cancel: self.cancel,
        })
    }
}

impl Default for EnhancementPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified enhancement pipeline that consolidates all processing logic
///
/// The pipeline analyzes the input, routes each capable operation between
/// local filters and the configured remote provider, executes the planned
/// stages with masked compositing, standardizes the canvas, and encodes the
/// result within the configured size target.
pub struct EnhancementPipeline {
    config: EnhancementConfig,
    remote: Option<Arc<dyn RemoteEnhancer>>,
    cost_guard: Arc<dyn CostGuard>,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for EnhancementPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementPipeline")
            .field("config", &self.config)
            .field("has_remote", &self.remote.is_some())
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// What happened when a routed operation was attempted remotely
enum RemoteAttempt {
    /// The remote call succeeded; the step is ready to record
    Completed {
        outcome: RemoteOutcome,
        step: ProcessingStep,
    },
    /// The remote path was not taken or failed; any failure steps are
    /// recorded and the stage falls through to local execution
    FellBack {
        steps: Vec<ProcessingStep>,
        local_detail: Option<String>,
    },
}

impl EnhancementPipeline {
    /// Create a pipeline with no remote provider and a fresh daily ledger
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidConfig` when the configuration
    /// fails validation.
    pub fn new(config: EnhancementConfig) -> Result<Self> {
        EnhancementPipelineBuilder::new().config(config).build()
    }

    /// Builder for pipelines with a remote provider, shared cost guard, or
    /// cancellation token
    #[must_use]
    pub fn builder() -> EnhancementPipelineBuilder {
        EnhancementPipelineBuilder::new()
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    /// Current spend against the daily remote budget
    #[must_use]
    pub fn usage(&self) -> UsageStats {
        self.cost_guard.usage()
    }

    /// Measure quality without modifying the image
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidInput` for images with a zero
    /// dimension.
    pub fn analyze(&self, image: &DynamicImage) -> Result<QualityReport> {
        let image_metrics = metrics::analyze(image)?;
        Ok(quality::report(&image_metrics, &self.config.thresholds, None))
    }

    /// Decode and measure quality, including the encoded payload size
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidInput` for empty or undecodable
    /// payloads.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<QualityReport> {
        let image = ImageIOService::decode_image(bytes)?;
        let image_metrics = metrics::analyze(&image)?;
        Ok(quality::report(
            &image_metrics,
            &self.config.thresholds,
            Some(bytes.len() as u64),
        ))
    }

    /// Enhance a decoded image
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid input or cancellation. Stage
    /// failures are recorded in the result's step list and the run
    /// continues with the last good image.
    pub async fn enhance(
        &self,
        image: &DynamicImage,
        mode: EnhancementMode,
    ) -> Result<EnhancementResult> {
        self.enhance_inner(image, mode, 0).await
    }

    /// Decode raw image bytes and enhance them
    ///
    /// This method accepts encoded image data directly, making it suitable
    /// for web servers and memory-based processing where files are not
    /// available.
    ///
    /// # Arguments
    /// * `bytes` - Raw image data (JPEG, PNG, WebP, TIFF)
    /// * `mode` - Which stages the planner should schedule
    ///
    /// # Returns
    /// An `EnhancementResult` with the processed image, step provenance,
    /// routing decisions, and encoded output
    ///
    /// # Errors
    ///
    /// Returns `EnhancementError::InvalidInput` when the payload is empty
    /// or cannot be decoded.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use pixlift::{EnhancementConfig, EnhancementMode, EnhancementPipeline};
    ///
    /// # async fn example(image_data: Vec<u8>) -> pixlift::Result<()> {
    /// let pipeline = EnhancementPipeline::new(EnhancementConfig::default())?;
    /// let result = pipeline.enhance_bytes(&image_data, EnhancementMode::Auto).await?;
    /// if let Some(bytes) = result.output_bytes() {
    ///     std::fs::write("enhanced.jpg", bytes)?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn enhance_bytes(
        &self,
        bytes: &[u8],
        mode: EnhancementMode,
    ) -> Result<EnhancementResult> {
        let image = ImageIOService::decode_image(bytes)?;
        self.enhance_inner(&image, mode, bytes.len() as u64).await
    }

    #[instrument(
        skip(self, image),
        fields(
            mode = %mode,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    async fn enhance_inner(
        &self,
        image: &DynamicImage,
        mode: EnhancementMode,
        original_size_bytes: u64,
    ) -> Result<EnhancementResult> {
        let total_start = Instant::now();
        let mut timings = EnhancementTimings::default();
        let original_dimensions = (image.width(), image.height());

        if original_dimensions.0 == 0 || original_dimensions.1 == 0 {
            return Err(EnhancementError::invalid_input(
                "image has zero width or height",
            ));
        }
        self.ensure_not_cancelled()?;

        trace_info!(mode = %mode, "🎯 Starting enhancement");

        // Measure the input and score it
        let analyze_start = Instant::now();
        let metrics_before = {
            let _span = span!(
                Level::DEBUG,
                "analysis",
                width = %original_dimensions.0,
                height = %original_dimensions.1
            )
            .entered();
            metrics::analyze(image)?
        };
        let quality_before = quality::score(&metrics_before, &self.config.thresholds);
        timings.analyze_ms = analyze_start.elapsed().as_millis() as u64;

        // Route every capable operation once, against the pre-enhancement
        // metrics and the current budget state
        let decisions = routing::route_all(
            &metrics_before,
            &self.config.routing,
            self.remote.is_some(),
            self.cost_guard.check(),
        );

        let plan = plan_for_mode(mode, &metrics_before, &self.config);
        trace_debug!(
            stages = plan.len(),
            tier = %quality_before.tier,
            "Planned stage chain"
        );

        // Execute the plan
        let stages_start = Instant::now();
        let mut working = image.clone();
        let mut mask: Option<AlphaMask> = None;
        let mut steps: Vec<ProcessingStep> = Vec::new();
        let mut remote_cost = 0.0_f64;
        let mut remote_used = false;
        let mut background_removed = false;
        let mut preserve_resolution = false;
        let mut skip_finishers = false;

        for stage in plan {
            self.ensure_not_cancelled()?;

            if skip_finishers && matches!(stage, StageKind::Sharpen { .. } | StageKind::Contrast) {
                debug!(
                    "Skipping {} stage, remote upscaling already finished the image",
                    stage.name()
                );
                continue;
            }

            let stage_start = Instant::now();
            let routed = routed_operation(stage).filter(|operation| {
                decisions
                    .iter()
                    .any(|d| d.operation == *operation && d.use_remote)
            });

            let mut local_detail: Option<String> = None;
            let mut handled_remotely = false;

            if let Some(operation) = routed {
                match self.try_remote(operation, &working).await {
                    RemoteAttempt::Completed { outcome, step } => {
                        steps.push(step);
                        remote_used = true;
                        remote_cost += outcome.cost_usd;
                        let resized = outcome.image.width() != working.width()
                            || outcome.image.height() != working.height();
                        match operation {
                            Operation::BackgroundRemoval => {
                                background_removed = true;
                                mask = outcome.alpha.or(mask.take());
                                working = outcome.image;
                            },
                            Operation::Upscaling => {
                                preserve_resolution = true;
                                skip_finishers = true;
                                if let Some(m) = &mask {
                                    mask = Some(m.resize(
                                        outcome.image.width(),
                                        outcome.image.height(),
                                        FilterType::Triangle,
                                    ));
                                }
                                working = outcome.image;
                            },
                            Operation::Lighting => {
                                working = match (&mask, resized) {
                                    (Some(m), false) => {
                                        compositor::blend_with_mask(&working, &outcome.image, m)
                                    },
                                    _ => outcome.image,
                                };
                            },
                        }
                        handled_remotely = true;
                    },
                    RemoteAttempt::FellBack {
                        steps: failure_steps,
                        local_detail: detail,
                    } => {
                        steps.extend(failure_steps);
                        local_detail = detail;
                    },
                }
            }

            if !handled_remotely {
                match self.run_local_stage(stage, &working) {
                    Ok((output, stage_mask)) => {
                        if matches!(stage, StageKind::BackgroundRemoval) {
                            background_removed = true;
                            if stage_mask.is_some() {
                                mask = stage_mask;
                            }
                            working = output;
                        } else if stage.resizes() {
                            if let Some(m) = &mask {
                                mask = Some(m.resize(
                                    output.width(),
                                    output.height(),
                                    FilterType::Triangle,
                                ));
                            }
                            working = output;
                        } else {
                            // Stages after background removal only touch the
                            // subject; the cleared background stays intact
                            working = match &mask {
                                Some(m) => compositor::blend_with_mask(&working, &output, m),
                                None => output,
                            };
                        }
                        let latency = stage_start.elapsed().as_millis() as u64;
                        let mut step = ProcessingStep::local(stage.name(), latency);
                        if let Some(detail) = local_detail {
                            step = step.with_detail(detail);
                        }
                        steps.push(step);
                    },
                    Err(e) => {
                        warn!("Stage {} failed locally: {e}", stage.name());
                        let mut step = ProcessingStep::failed(
                            stage.name().to_string(),
                            StepMethod::Local,
                            e.to_string(),
                        );
                        if let Some(detail) = local_detail {
                            step.detail = Some(format!("{detail}: {e}"));
                        }
                        steps.push(step);
                    },
                }
            }
        }
        timings.stages_ms = stages_start.elapsed().as_millis() as u64;

        // Canvas standardization
        let run_standardize = match mode {
            EnhancementMode::Optimize => false,
            EnhancementMode::Standardize => true,
            _ => self.config.standardize,
        };
        if run_standardize {
            self.ensure_not_cancelled()?;
            let standardize_start = Instant::now();
            let (canvas, canvas_mask) = {
                let _span = span!(
                    Level::DEBUG,
                    "standardize",
                    width = %working.width(),
                    height = %working.height()
                )
                .entered();
                standardize::standardize(
                    &working,
                    mask.as_ref(),
                    &self.config.standardization,
                    preserve_resolution,
                )
            };
            working = canvas;
            mask = canvas_mask;
            timings.standardize_ms = standardize_start.elapsed().as_millis() as u64;
        }

        // Score the result; a failed re-measure degrades the report but
        // never the image
        self.ensure_not_cancelled()?;
        let rescore_start = Instant::now();
        let quality_after = match metrics::analyze(&working) {
            Ok(metrics_after) => Some(quality::score(&metrics_after, &self.config.thresholds)),
            Err(e) => {
                warn!("Post-enhancement analysis failed: {e}");
                None
            },
        };
        timings.analyze_ms += rescore_start.elapsed().as_millis() as u64;

        // Encode within the size target
        let encode_start = Instant::now();
        let (output, success, error) = {
            let _span = span!(
                Level::DEBUG,
                "encode",
                format = %self.config.output.format
            )
            .entered();
            match OutputEncoder::optimize(&working, &self.config.output) {
                Ok(encoded) => (Some(encoded), true, None),
                Err(e) => {
                    warn!("Output encoding failed: {e}");
                    (None, false, Some(e.to_string()))
                },
            }
        };
        timings.encode_ms = encode_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        trace_info!(
            success = success,
            steps = steps.len(),
            remote_cost_usd = remote_cost,
            total_ms = timings.total_ms,
            "✅ Enhancement complete"
        );

        let enhanced_dimensions = (working.width(), working.height());
        Ok(EnhancementResult {
            success,
            image: working,
            mask,
            original_dimensions,
            enhanced_dimensions,
            original_size_bytes,
            output,
            steps,
            decisions,
            remote_cost_usd: remote_cost,
            remote_used,
            background_removed,
            quality_before: Some(quality_before),
            quality_after,
            timings,
            error,
        })
    }

    /// Attempt one routed operation remotely, charging the ledger up front
    /// and refunding on failure
    async fn try_remote(&self, operation: Operation, image: &DynamicImage) -> RemoteAttempt {
        let remote = match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => {
                return RemoteAttempt::FellBack {
                    steps: Vec::new(),
                    local_detail: None,
                }
            },
        };

        let cost = match remote.catalog().cost_for(operation) {
            Some(cost) => cost,
            None => {
                return RemoteAttempt::FellBack {
                    steps: vec![ProcessingStep::failed(
                        operation.as_str().to_string(),
                        StepMethod::Remote,
                        "no remote model serves this operation".to_string(),
                    )],
                    local_detail: Some(format!("{}_fallback", operation.as_str())),
                }
            },
        };

        if !self.cost_guard.try_charge(operation.as_str(), cost) {
            debug!(
                "Daily budget cannot cover {} (${cost:.2}), running locally",
                operation.as_str()
            );
            return RemoteAttempt::FellBack {
                steps: Vec::new(),
                local_detail: Some("budget_exhausted".to_string()),
            };
        }

        let request = RemoteRequest {
            operation,
            image: image.clone(),
            params: RemoteParams::default(),
        };
        let timeout = Duration::from_secs(self.config.remote_timeout_secs);
        match tokio::time::timeout(timeout, remote.invoke(request)).await {
            Ok(Ok(outcome)) => {
                let step = ProcessingStep::remote(
                    operation.as_str(),
                    outcome.latency_ms,
                    outcome.cost_usd,
                )
                .with_detail(outcome.model_id.clone());
                RemoteAttempt::Completed { outcome, step }
            },
            Ok(Err(e)) => {
                self.cost_guard.refund(operation.as_str(), cost);
                warn!("Remote {} failed: {e}", operation.as_str());
                RemoteAttempt::FellBack {
                    steps: vec![ProcessingStep::failed(
                        operation.as_str().to_string(),
                        StepMethod::Remote,
                        e.to_string(),
                    )],
                    local_detail: Some(format!("{}_fallback", operation.as_str())),
                }
            },
            Err(_) => {
                self.cost_guard.refund(operation.as_str(), cost);
                warn!(
                    "Remote {} timed out after {}s",
                    operation.as_str(),
                    self.config.remote_timeout_secs
                );
                RemoteAttempt::FellBack {
                    steps: vec![ProcessingStep::failed(
                        operation.as_str().to_string(),
                        StepMethod::Remote,
                        format!("timed out after {}s", self.config.remote_timeout_secs),
                    )],
                    local_detail: Some(format!("{}_fallback", operation.as_str())),
                }
            },
        }
    }

    /// Run one stage with the local implementations
    fn run_local_stage(
        &self,
        stage: StageKind,
        image: &DynamicImage,
    ) -> Result<(DynamicImage, Option<AlphaMask>)> {
        let params = &self.config.params;
        Ok(match stage {
            StageKind::BackgroundRemoval => {
                let (cleared, subject_mask) = stages::background::remove_background(
                    image,
                    self.config.standardization.background_color,
                )?;
                (cleared, Some(subject_mask))
            },
            StageKind::Lighting => (stages::lighting::correct_lighting(image, params), None),
            StageKind::Denoise { strength } => {
                (stages::denoise::reduce_noise(image, strength), None)
            },
            StageKind::Upscale { factor } => (
                stages::upscale::upscale(image, factor, params.max_upscale_dimension),
                None,
            ),
            StageKind::Sharpen { strength } => (
                stages::sharpen::sharpen_edges(image, strength, params.sharpen_radius),
                None,
            ),
            StageKind::Contrast => (stages::lighting::enhance_contrast(image, params), None),
            StageKind::Saturation { factor } => {
                (stages::color::adjust_saturation(image, factor), None)
            },
        })
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                Err(EnhancementError::cancelled("enhancement cancelled"))
            },
            _ => Ok(()),
        }
    }
}

/// Map a stage to the operation the router decides on, when one exists
fn routed_operation(stage: StageKind) -> Option<Operation> {
    match stage {
        StageKind::BackgroundRemoval => Some(Operation::BackgroundRemoval),
        StageKind::Upscale { .. } => Some(Operation::Upscaling),
        StageKind::Lighting => Some(Operation::Lighting),
        _ => None,
    }
}

/// Build the stage chain for a mode
///
/// `Auto` schedules only what the measured metrics call for; fixed modes
/// schedule their stages unconditionally with the configured parameters.
fn plan_for_mode(
    mode: EnhancementMode,
    image_metrics: &QualityMetrics,
    config: &EnhancementConfig,
) -> Vec<StageKind> {
    let params = &config.params;
    match mode {
        EnhancementMode::Auto => {
            let mut plan = Vec::new();
            if image_metrics.noise > 15.0 {
                plan.push(StageKind::Denoise {
                    strength: (image_metrics.noise / 2.0).min(20.0),
                });
            }
            if image_metrics.brightness < 80.0 || image_metrics.brightness > 200.0 {
                plan.push(StageKind::Lighting);
            }
            if image_metrics.contrast < 40.0 {
                plan.push(StageKind::Contrast);
            }
            if image_metrics.blur_score < 200.0 {
                let strength = if image_metrics.blur_score < config.thresholds.blur_acceptable {
                    2.0
                } else {
                    1.5
                };
                plan.push(StageKind::Sharpen { strength });
            }
            plan.push(StageKind::Saturation {
                factor: params.saturation_boost,
            });
            plan
        },
        EnhancementMode::Full => {
            let mut plan = vec![
                StageKind::BackgroundRemoval,
                StageKind::Lighting,
                StageKind::Denoise {
                    strength: f64::from(params.denoise_strength),
                },
            ];
            if image_metrics.min_dimension() < config.routing.low_res_threshold {
                plan.push(StageKind::Upscale {
                    factor: f64::from(params.upscale_factor),
                });
            }
            plan.push(StageKind::Sharpen {
                strength: params.sharpen_strength,
            });
            plan.push(StageKind::Contrast);
            plan
        },
        EnhancementMode::BackgroundRemove => vec![StageKind::BackgroundRemoval],
        EnhancementMode::LightCorrection => vec![StageKind::Lighting],
        EnhancementMode::UpscaleDenoise => vec![
            StageKind::Denoise {
                strength: f64::from(params.denoise_strength),
            },
            StageKind::Upscale {
                factor: f64::from(params.upscale_factor),
            },
        ],
        EnhancementMode::Sharpen => vec![StageKind::Sharpen {
            strength: params.sharpen_strength,
        }],
        EnhancementMode::Denoise => vec![StageKind::Denoise {
            strength: f64::from(params.denoise_strength),
        }],
        EnhancementMode::Upscale => vec![StageKind::Upscale {
            factor: f64::from(params.upscale_factor),
        }],
        EnhancementMode::Standardize | EnhancementMode::Optimize => Vec::new(),
    }
}
