//! Test utilities and mock providers for the remote enhancement trait
//!
//! This module provides a mock implementation of the [`RemoteEnhancer`]
//! trait to enable comprehensive pipeline testing without a live service
//! or network access.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::imageops::FilterType;

use crate::error::{EnhancementError, Result};
use crate::remote::{ProviderCatalog, RemoteEnhancer, RemoteOutcome, RemoteRequest};
use crate::routing::Operation;
use crate::types::AlphaMask;

/// Mock remote provider with scripted behaviors
#[derive(Debug, Clone)]
pub struct MockRemoteEnhancer {
    /// Advertised models
    catalog: ProviderCatalog,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Operations that should fail when invoked
    failing_operations: Vec<Operation>,
    /// Reported latency per call
    latency_ms: u64,
}

impl MockRemoteEnhancer {
    /// Create a mock provider that succeeds on every operation
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: ProviderCatalog::default_catalog(),
            call_history: Arc::new(Mutex::new(Vec::new())),
            failing_operations: Vec::new(),
            latency_ms: 5,
        }
    }

    /// Create a mock provider that fails every operation
    #[must_use]
    pub fn new_failing() -> Self {
        let mut mock = Self::new();
        mock.failing_operations = vec![
            Operation::BackgroundRemoval,
            Operation::Upscaling,
            Operation::Lighting,
        ];
        mock
    }

    /// Create a mock provider that fails only the given operation
    #[must_use]
    pub fn new_failing_operation(operation: Operation) -> Self {
        let mut mock = Self::new();
        mock.failing_operations = vec![operation];
        mock
    }

    /// Replace the advertised catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Clear the call history
    pub fn clear_call_history(&self) {
        self.call_history.lock().unwrap().clear();
    }

    fn record_call(&self, operation: Operation) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(operation.as_str().to_string());
        }
    }

    /// Soft circular mask centered on the frame, mimicking a typical
    /// segmentation result
    fn circular_mask(width: u32, height: u32) -> AlphaMask {
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        let radius = (width.min(height) as f32 / 3.0).max(10.0);
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - center_x;
                let dy = y as f32 - center_y;
                let distance = (dx * dx + dy * dy).sqrt();
                let value = if distance < radius {
                    ((radius - distance) / radius).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                data.push((value * 255.0).round() as u8);
            }
        }
        AlphaMask::new(data, (width, height))
    }
}

impl Default for MockRemoteEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteEnhancer for MockRemoteEnhancer {
    fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteOutcome> {
        let operation = request.operation;
        self.record_call(operation);

        if self.failing_operations.contains(&operation) {
            return Err(EnhancementError::remote_error_with_provider(
                "mock",
                operation.as_str(),
                "scripted failure",
            ));
        }

        let model = self.catalog.supports(operation).ok_or_else(|| {
            EnhancementError::unsupported_operation(format!(
                "no mock model serves {operation}"
            ))
        })?;

        let (width, height) = (request.image.width(), request.image.height());
        let (image, alpha) = match operation {
            Operation::BackgroundRemoval => (
                request.image.clone(),
                Some(Self::circular_mask(width, height)),
            ),
            Operation::Upscaling => {
                let cap = model.max_output_dimension.max(1);
                let factor = f64::from(cap) / f64::from(width.max(height));
                let factor = factor.min(2.0).max(1.0);
                let w = ((f64::from(width) * factor).round() as u32).max(1);
                let h = ((f64::from(height) * factor).round() as u32).max(1);
                (request.image.resize_exact(w, h, FilterType::Triangle), None)
            },
            Operation::Lighting => (
                image::DynamicImage::ImageRgba8(image::imageops::brighten(
                    &request.image.to_rgba8(),
                    20,
                )),
                None,
            ),
        };

        Ok(RemoteOutcome {
            image,
            alpha,
            cost_usd: model.cost_per_call,
            latency_ms: self.latency_ms,
            model_id: model.model_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn request(operation: Operation, size: u32) -> RemoteRequest {
        RemoteRequest {
            operation,
            image: image::DynamicImage::ImageRgba8(RgbaImage::new(size, size)),
            params: crate::remote::RemoteParams::default(),
        }
    }

    #[tokio::test]
    async fn test_background_removal_yields_mask() {
        let mock = MockRemoteEnhancer::new();
        let outcome = mock
            .invoke(request(Operation::BackgroundRemoval, 64))
            .await
            .expect("mock succeeds");
        let mask = outcome.alpha.expect("mask present");
        assert!(mask.weight_at(32, 32) > 0.8);
        assert!(mask.weight_at(0, 0) < 0.05);
        assert!((outcome.cost_usd - 0.01).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_upscaling_grows_image() {
        let mock = MockRemoteEnhancer::new();
        let outcome = mock
            .invoke(request(Operation::Upscaling, 400))
            .await
            .expect("mock succeeds");
        assert_eq!(outcome.image.width(), 800);
        assert_eq!(outcome.model_id, "studio-enhance-v2");
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mock = MockRemoteEnhancer::new_failing_operation(Operation::Lighting);
        assert!(mock.invoke(request(Operation::Lighting, 32)).await.is_err());
        assert!(mock
            .invoke(request(Operation::Upscaling, 32))
            .await
            .is_ok());
        assert_eq!(mock.get_call_history(), vec!["lighting", "upscaling"]);
    }
}
