//! HTTP remote enhancement provider
//!
//! Speaks a small JSON protocol: the image travels as base64 PNG in both
//! directions, with an optional base64 grayscale mask on responses to
//! segmentation calls. Transport and provider-side failures all surface
//! as [`EnhancementError::RemoteService`] so the pipeline can fall back
//! to local processing.

use base64::Engine as _;
use instant::Instant;
use serde::{Deserialize, Serialize};

use async_trait::async_trait;

use crate::config::OutputFormat;
use crate::error::{EnhancementError, Result};
use crate::remote::{
    fit_to_input_limit, ProviderCatalog, RemoteEnhancer, RemoteOutcome, RemoteRequest,
};
use crate::services::OutputEncoder;
use crate::types::AlphaMask;

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    operation: &'a str,
    model: &'a str,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    image: Option<String>,
    mask: Option<String>,
    #[serde(default)]
    latency_ms: Option<u64>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Remote enhancer backed by a JSON-over-HTTP service
pub struct HttpRemoteEnhancer {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    catalog: ProviderCatalog,
}

impl HttpRemoteEnhancer {
    /// Create a provider against `endpoint` with a per-request timeout
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| {
                EnhancementError::internal(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
            catalog: ProviderCatalog::default_catalog(),
        })
    }

    /// Replace the default catalog with the service's real offering
    #[must_use]
    pub fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn decode_payload(data: &str, context: &str) -> Result<image::DynamicImage> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| {
                EnhancementError::remote_service(format!("invalid base64 in {context}: {e}"))
            })?;
        image::load_from_memory(&bytes).map_err(|e| {
            EnhancementError::remote_service(format!("undecodable image in {context}: {e}"))
        })
    }
}

#[async_trait]
impl RemoteEnhancer for HttpRemoteEnhancer {
    fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteOutcome> {
        let operation = request.operation;
        let model = self.catalog.supports(operation).ok_or_else(|| {
            EnhancementError::unsupported_operation(format!(
                "no remote model serves {operation}"
            ))
        })?;

        let sized = fit_to_input_limit(&request.image, model.max_input_dimension);
        let png = OutputEncoder::encode(&sized, OutputFormat::Png, 0, 6)?;
        let payload = ApiRequest {
            operation: operation.as_str(),
            model: &model.model_id,
            image: base64::engine::general_purpose::STANDARD.encode(&png),
            prompt: request.params.prompt.as_deref(),
            similarity: request.params.similarity,
        };

        tracing::info!(
            operation = %operation,
            model = %model.model_id,
            input = format!("{}x{}", sized.width(), sized.height()),
            "Sending remote enhancement request"
        );

        let started = Instant::now();
        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let response = builder.send().await.map_err(|e| {
            EnhancementError::remote_error_with_provider(
                "http",
                operation.as_str(),
                &format!("request failed: {e}"),
            )
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EnhancementError::remote_error_with_provider(
                "http",
                operation.as_str(),
                "rate limited",
            ));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(EnhancementError::remote_error_with_provider(
                "http",
                operation.as_str(),
                "authentication failed",
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnhancementError::remote_error_with_provider(
                "http",
                operation.as_str(),
                &format!("service error {status}: {body}"),
            ));
        }

        let parsed: ApiResponse = response.json().await.map_err(|e| {
            EnhancementError::remote_service(format!("unparseable response: {e}"))
        })?;
        if let Some(err) = parsed.error {
            return Err(EnhancementError::remote_error_with_provider(
                "http",
                operation.as_str(),
                &err.message,
            ));
        }

        let image_b64 = parsed.image.ok_or_else(|| {
            EnhancementError::remote_service("response carries no image".to_string())
        })?;
        let image = Self::decode_payload(&image_b64, "response image")?;
        let alpha = match parsed.mask {
            Some(mask_b64) => {
                let mask_img = Self::decode_payload(&mask_b64, "response mask")?;
                Some(AlphaMask::from_image(&mask_img.to_luma8()))
            },
            None => None,
        };

        let latency_ms = parsed
            .latency_ms
            .unwrap_or_else(|| started.elapsed().as_millis() as u64);

        Ok(RemoteOutcome {
            image,
            alpha,
            cost_usd: model.cost_per_call,
            latency_ms,
            model_id: model.model_id.clone(),
        })
    }
}
