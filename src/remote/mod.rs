//! Remote enhancement providers
//!
//! A remote provider serves the three heavy operations through hosted
//! models. The pipeline talks to providers through the [`RemoteEnhancer`]
//! trait so an HTTP service, a cloud SDK wrapper, or a test double all
//! plug in the same way. Each provider publishes a [`ProviderCatalog`]
//! describing its models, per-call pricing, and dimension limits; the
//! pipeline uses the catalog for cost reservation and input sizing.

#[cfg(feature = "remote-http")]
pub mod http;

#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "remote-http")]
pub use self::http::HttpRemoteEnhancer;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routing::Operation;
use crate::types::AlphaMask;

/// Optional knobs forwarded to the provider
#[derive(Debug, Clone, Default)]
pub struct RemoteParams {
    /// Free-text guidance for generative providers
    pub prompt: Option<String>,
    /// How closely the output should track the input, in [0, 1]
    pub similarity: Option<f32>,
}

/// One remote call
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    /// Which operation to perform
    pub operation: Operation,
    /// Input image; providers fit it to their model's input limit
    pub image: DynamicImage,
    /// Provider-specific knobs
    pub params: RemoteParams,
}

/// Successful remote result
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    /// The processed image
    pub image: DynamicImage,
    /// Subject mask when the operation produces one
    pub alpha: Option<AlphaMask>,
    /// What the call actually cost in USD
    pub cost_usd: f64,
    /// Provider-reported or measured latency
    pub latency_ms: u64,
    /// Which model served the call
    pub model_id: String,
}

/// One model a provider offers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteModelSpec {
    /// Stable model identifier
    pub model_id: String,
    /// Operations this model can serve
    pub operations: Vec<Operation>,
    /// Price per call in USD
    pub cost_per_call: f64,
    /// Longest input side the model accepts
    pub max_input_dimension: u32,
    /// Longest output side the model produces
    pub max_output_dimension: u32,
    /// Whether the model is currently usable
    pub available: bool,
}

/// The models a provider offers, used for routing and cost reservation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCatalog {
    /// Offered models
    pub models: Vec<RemoteModelSpec>,
}

impl ProviderCatalog {
    /// Cheapest available model serving `operation`, if any
    #[must_use]
    pub fn supports(&self, operation: Operation) -> Option<&RemoteModelSpec> {
        self.models
            .iter()
            .filter(|m| m.available && m.operations.contains(&operation))
            .min_by(|a, b| {
                a.cost_per_call
                    .partial_cmp(&b.cost_per_call)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Per-call price for `operation`, if any model serves it
    #[must_use]
    pub fn cost_for(&self, operation: Operation) -> Option<f64> {
        self.supports(operation).map(|m| m.cost_per_call)
    }

    /// Catalog mirroring a typical hosted image stack: a multi-operation
    /// editing model and a cheaper segmentation-only model.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self {
            models: vec![
                RemoteModelSpec {
                    model_id: "studio-enhance-v2".to_string(),
                    operations: vec![
                        Operation::BackgroundRemoval,
                        Operation::Upscaling,
                        Operation::Lighting,
                    ],
                    cost_per_call: 0.04,
                    max_input_dimension: 1408,
                    max_output_dimension: 2048,
                    available: true,
                },
                RemoteModelSpec {
                    model_id: "matte-cut-v1".to_string(),
                    operations: vec![Operation::BackgroundRemoval],
                    cost_per_call: 0.01,
                    max_input_dimension: 1024,
                    max_output_dimension: 2048,
                    available: true,
                },
            ],
        }
    }
}

/// A hosted enhancement service.
///
/// Implementations must be shareable across concurrently running
/// pipelines.
#[async_trait]
pub trait RemoteEnhancer: Send + Sync {
    /// The models this provider offers
    fn catalog(&self) -> &ProviderCatalog;

    /// Perform one operation remotely
    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteOutcome>;
}

/// Shrink an image to fit a model's input limit, preserving aspect.
/// Images already within the limit are returned unchanged.
#[must_use]
pub fn fit_to_input_limit(image: &DynamicImage, max_input_dimension: u32) -> DynamicImage {
    let longest = image.width().max(image.height());
    if max_input_dimension == 0 || longest <= max_input_dimension {
        return image.clone();
    }
    let scale = f64::from(max_input_dimension) / f64::from(longest);
    let w = ((f64::from(image.width()) * scale).round() as u32).max(1);
    let h = ((f64::from(image.height()) * scale).round() as u32).max(1);
    log::debug!(
        "Downscaling {}x{} to {}x{} for remote input limit {}",
        image.width(),
        image.height(),
        w,
        h,
        max_input_dimension
    );
    image.resize_exact(w, h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_catalog_prefers_cheapest_model() {
        let catalog = ProviderCatalog::default_catalog();
        let model = catalog
            .supports(Operation::BackgroundRemoval)
            .expect("model available");
        assert_eq!(model.model_id, "matte-cut-v1");
        assert!((catalog.cost_for(Operation::BackgroundRemoval).unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_catalog_falls_back_to_multi_operation_model() {
        let catalog = ProviderCatalog::default_catalog();
        let model = catalog.supports(Operation::Upscaling).expect("model");
        assert_eq!(model.model_id, "studio-enhance-v2");
    }

    #[test]
    fn test_unavailable_models_are_skipped() {
        let mut catalog = ProviderCatalog::default_catalog();
        for model in &mut catalog.models {
            model.available = false;
        }
        assert!(catalog.supports(Operation::Lighting).is_none());
        assert!(catalog.cost_for(Operation::Lighting).is_none());
    }

    #[test]
    fn test_fit_to_input_limit_preserves_aspect() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(2816, 1408));
        let out = fit_to_input_limit(&img, 1408);
        assert_eq!(out.width(), 1408);
        assert_eq!(out.height(), 704);
    }

    #[test]
    fn test_fit_to_input_limit_noop_when_small() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(640, 480));
        let out = fit_to_input_limit(&img, 1408);
        assert_eq!(out.width(), 640);
    }
}
