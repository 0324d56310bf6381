#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Pixlift Product Photo Enhancement Library
//!
//! A quality-adaptive enhancement pipeline for product photography. Every
//! image is measured first, and the measurements drive everything that
//! follows: which stages run, whether each capable operation executes with
//! local filters or a remote model provider, and how hard the encoder has
//! to work to hit the output size target.
//!
//! ## Features
//!
//! - **Quality Analysis**: Sharpness, brightness, contrast, noise, and
//!   background complexity metrics with a composite 0-100 score
//! - **Adaptive Routing**: Per-operation local-vs-remote decisions with
//!   explained reasons and a daily cost budget
//! - **Local Stages**: Background removal, lighting correction, denoising,
//!   upscaling, sharpening, contrast, and saturation, all in pure Rust
//! - **Remote Providers**: Pluggable `RemoteEnhancer` trait with an HTTP
//!   implementation and automatic local fallback on failure
//! - **Masked Compositing**: Stages after background removal only touch
//!   the subject, keeping the cleared background intact
//! - **Canvas Standardization**: Square-ish catalog canvases with padding
//!   and background fill
//! - **Size-Targeted Encoding**: JPEG quality descent until the encoded
//!   output fits the configured size ceiling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixlift::{EnhancementConfig, EnhancementMode, EnhancementPipeline};
//!
//! # async fn example() -> pixlift::Result<()> {
//! let image_bytes = std::fs::read("product.jpg")?;
//!
//! let pipeline = EnhancementPipeline::new(EnhancementConfig::default())?;
//! let result = pipeline
//!     .enhance_bytes(&image_bytes, EnhancementMode::Auto)
//!     .await?;
//!
//! if let Some(bytes) = result.output_bytes() {
//!     std::fs::write("enhanced.jpg", bytes)?;
//! }
//! for step in &result.steps {
//!     println!("{}: {} ({}ms)", step.stage, step.method, step.latency_ms);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Remote Providers
//!
//! Attach a provider to let the router send hard images (busy backgrounds,
//! low resolution) to remote models, within the daily budget:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pixlift::{EnhancementConfig, EnhancementMode, EnhancementPipeline, HttpRemoteEnhancer};
//!
//! # async fn example(image_bytes: Vec<u8>) -> pixlift::Result<()> {
//! let remote = HttpRemoteEnhancer::new(
//!     "https://api.example.com/v1/enhance",
//!     Some("api-key".to_string()),
//!     30,
//! )?;
//! let pipeline = EnhancementPipeline::builder()
//!     .config(EnhancementConfig::default())
//!     .remote(Arc::new(remote))
//!     .build()?;
//! let result = pipeline
//!     .enhance_bytes(&image_bytes, EnhancementMode::Full)
//!     .await?;
//! println!("remote spend: ${:.2}", result.remote_cost_usd);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `remote-http` (default): HTTP remote provider built on `reqwest`
//! - `webp-support` (default): WebP output encoding

pub mod compositor;
pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod remote;
pub mod routing;
pub mod services;
pub mod stages;
pub mod standardize;
pub mod types;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use config::{
    EnhancementConfig, EnhancementConfigBuilder, EnhancementParams, OutputConfig, OutputFormat,
    QualityThresholds, RoutingConfig, StandardizationSpec,
};
pub use cost::{ChargeRecord, CostGuard, DailyCostGuard, UsageStats};
pub use error::{EnhancementError, Result};
pub use metrics::{analyze as analyze_image, laplacian_variance, QualityMetrics};
pub use pipeline::{
    EnhancementMode, EnhancementPipeline, EnhancementPipelineBuilder,
};
pub use quality::{QualityIssue, QualityReport, QualityScore, QualityTier};
pub use remote::{
    ProviderCatalog, RemoteEnhancer, RemoteModelSpec, RemoteOutcome, RemoteParams, RemoteRequest,
};
pub use routing::{Operation, RoutingDecision};
pub use services::{ImageIOService, OutputEncoder};
pub use stages::StageKind;
pub use types::{
    AlphaMask, EncodedOutput, EnhancementResult, EnhancementTimings, ProcessingStep, StepMethod,
};

#[cfg(feature = "remote-http")]
pub use remote::HttpRemoteEnhancer;

/// Enhance an image provided as bytes
///
/// This is a stream-based API that accepts encoded image data, making it
/// suitable for web servers, memory-based processing, and scenarios where
/// files aren't available. A fresh pipeline (and therefore a fresh daily
/// cost ledger) is built per call; callers that process many images should
/// hold an [`EnhancementPipeline`] instead.
///
/// # Arguments
///
/// * `image_bytes` - Raw image data as bytes (JPEG, PNG, WebP, TIFF)
/// * `config` - Configuration for the enhancement run
/// * `mode` - Which stages the planner should schedule
///
/// # Returns
///
/// An `EnhancementResult` containing the processed image, step provenance,
/// routing decisions, and encoded output
///
/// # Examples
///
/// ```rust,no_run
/// use pixlift::{enhance_from_bytes, EnhancementConfig, EnhancementMode};
///
/// # async fn example(upload_bytes: Vec<u8>) -> pixlift::Result<()> {
/// let config = EnhancementConfig::default();
/// let result = enhance_from_bytes(&upload_bytes, &config, EnhancementMode::Auto).await?;
/// if let Some(improvement) = result.quality_improvement() {
///     println!("quality changed by {improvement:+.1} points");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn enhance_from_bytes(
    image_bytes: &[u8],
    config: &EnhancementConfig,
    mode: EnhancementMode,
) -> Result<EnhancementResult> {
    let pipeline = EnhancementPipeline::new(config.clone())?;
    pipeline.enhance_bytes(image_bytes, mode).await
}

/// Enhance a `DynamicImage` directly
///
/// This is the most flexible API for in-memory processing. It accepts a
/// pre-decoded `DynamicImage` and processes it without any file I/O.
///
/// # Arguments
///
/// * `image` - A `DynamicImage` to process (from the image crate)
/// * `config` - Configuration for the enhancement run
/// * `mode` - Which stages the planner should schedule
///
/// # Returns
///
/// An `EnhancementResult` containing the processed image, step provenance,
/// routing decisions, and encoded output
///
/// # Examples
///
/// ```rust,no_run
/// use pixlift::{enhance_from_image, EnhancementConfig, EnhancementMode};
/// use image::DynamicImage;
///
/// # async fn example(img: DynamicImage) -> pixlift::Result<()> {
/// let config = EnhancementConfig::default();
/// let result = enhance_from_image(img, &config, EnhancementMode::Full).await?;
/// result.save("enhanced.jpg")?;
/// # Ok(())
/// # }
/// ```
pub async fn enhance_from_image(
    image: image::DynamicImage,
    config: &EnhancementConfig,
    mode: EnhancementMode,
) -> Result<EnhancementResult> {
    let pipeline = EnhancementPipeline::new(config.clone())?;
    pipeline.enhance(&image, mode).await
}

/// Enhance an image from an async reader stream
///
/// Accepts any async readable stream, making it suitable for processing
/// images from network streams, large files, or any other async source.
///
/// # Arguments
///
/// * `reader` - Any type implementing `AsyncRead + Unpin`
/// * `config` - Configuration for the enhancement run
/// * `mode` - Which stages the planner should schedule
///
/// # Returns
///
/// An `EnhancementResult` containing the processed image, step provenance,
/// routing decisions, and encoded output
///
/// # Examples
///
/// ```rust,no_run
/// use pixlift::{enhance_from_reader, EnhancementConfig, EnhancementMode};
/// use tokio::fs::File;
///
/// # async fn example() -> pixlift::Result<()> {
/// let file = File::open("product.jpg").await?;
/// let config = EnhancementConfig::default();
/// let result = enhance_from_reader(file, &config, EnhancementMode::Auto).await?;
/// result.save("enhanced.jpg")?;
/// # Ok(())
/// # }
/// ```
pub async fn enhance_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    config: &EnhancementConfig,
    mode: EnhancementMode,
) -> Result<EnhancementResult> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer)
        .await
        .map_err(|e| EnhancementError::processing(format!("Failed to read from stream: {}", e)))?;

    enhance_from_bytes(&buffer, config, mode).await
}

/// Measure quality without modifying the image
///
/// Decodes the payload, extracts all quality metrics, scores them against
/// the configured thresholds, and lists the concrete issues found.
///
/// # Arguments
///
/// * `image_bytes` - Raw image data as bytes (JPEG, PNG, WebP, TIFF)
/// * `config` - Configuration supplying the scoring thresholds
///
/// # Returns
///
/// A `QualityReport` with metrics, the composite score, and issue
/// descriptions
///
/// # Examples
///
/// ```rust,no_run
/// use pixlift::{analyze_from_bytes, EnhancementConfig};
///
/// # fn example(upload_bytes: Vec<u8>) -> pixlift::Result<()> {
/// let report = analyze_from_bytes(&upload_bytes, &EnhancementConfig::default())?;
/// println!("score {:.0} ({})", report.score.overall, report.score.tier);
/// for issue in &report.issues {
///     println!("- {}: {}", issue.description, issue.recommendation);
/// }
/// # Ok(())
/// # }
/// ```
pub fn analyze_from_bytes(
    image_bytes: &[u8],
    config: &EnhancementConfig,
) -> Result<QualityReport> {
    let image = ImageIOService::decode_image(image_bytes)?;
    let image_metrics = metrics::analyze(&image)?;
    Ok(quality::report(
        &image_metrics,
        &config.thresholds,
        Some(image_bytes.len() as u64),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([value, value, value, 255]),
        ));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_bytes_api_round_trip() {
        let bytes = png_bytes(32, 32, 180);
        let mut config = EnhancementConfig::default();
        config.standardize = false;
        config.output.target_max_size_kb = None;

        let result = enhance_from_bytes(&bytes, &config, EnhancementMode::Optimize)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.original_size_bytes, bytes.len() as u64);
        assert!(result.output.is_some());
    }

    #[test]
    fn test_analysis_flags_a_flat_gray_square() {
        let bytes = png_bytes(64, 64, 128);
        let report = analyze_from_bytes(&bytes, &EnhancementConfig::default()).unwrap();

        // A flat 64px square is both blurry and undersized
        assert!(report.needs_enhancement);
        assert!(!report.issues.is_empty());
        assert!(report.score.sharpness < 50.0);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let config = EnhancementConfig::default();
        let err = enhance_from_bytes(&[], &config, EnhancementMode::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, EnhancementError::InvalidInput(_)));
    }
}
