//! Shared fixtures and a scriptable remote provider for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use pixlift::{
    AlphaMask, EnhancementError, Operation, ProviderCatalog, RemoteEnhancer, RemoteOutcome,
    RemoteRequest, Result,
};

/// Flat single-color image
pub(crate) fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([rgb[0], rgb[1], rgb[2], 255]),
    ))
}

/// High-contrast checkerboard, sharp everywhere
pub(crate) fn checkerboard(width: u32, height: u32, cell: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([235, 235, 235, 255])
        } else {
            Rgba([20, 20, 20, 255])
        }
    });
    DynamicImage::ImageRgba8(img)
}

/// Dark product centered on a clean light backdrop, the easy case for
/// local segmentation
pub(crate) fn product_shot(size: u32) -> DynamicImage {
    let mut img = RgbaImage::from_pixel(size, size, Rgba([240, 240, 240, 255]));
    let quarter = size / 4;
    for y in quarter..(size - quarter) {
        for x in quarter..(size - quarter) {
            img.put_pixel(x, y, Rgba([60, 40, 30, 255]));
        }
    }
    DynamicImage::ImageRgba8(img)
}

/// Dark product centered on a busy checkerboard backdrop, the case that
/// trips local segmentation and routes remotely
pub(crate) fn busy_product_shot(size: u32) -> DynamicImage {
    let mut img = checkerboard(size, size, 8).to_rgba8();
    let quarter = size / 4;
    for y in quarter..(size - quarter) {
        for x in quarter..(size - quarter) {
            img.put_pixel(x, y, Rgba([60, 40, 30, 255]));
        }
    }
    DynamicImage::ImageRgba8(img)
}

/// Mid-gray image with deterministic pseudo-random noise
pub(crate) fn noisy_image(width: u32, height: u32, amplitude: i32) -> DynamicImage {
    let mut seed = 0x2545_f491u32;
    let img = RgbaImage::from_fn(width, height, |_, _| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let offset = ((seed >> 16) as i32 % (2 * amplitude + 1)) - amplitude;
        let v = (128 + offset).clamp(0, 255) as u8;
        Rgba([v, v, v, 255])
    });
    DynamicImage::ImageRgba8(img)
}

/// Encode an image to PNG bytes in memory
pub(crate) fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("PNG encoding succeeds for test fixtures");
    bytes
}

/// Scriptable remote provider for exercising routing, fallback, and
/// budget behavior through the public API
pub(crate) struct StubRemoteProvider {
    catalog: ProviderCatalog,
    calls: Arc<Mutex<Vec<String>>>,
    failing_operations: Vec<Operation>,
}

impl StubRemoteProvider {
    pub(crate) fn new() -> Self {
        Self {
            catalog: ProviderCatalog::default_catalog(),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_operations: Vec::new(),
        }
    }

    /// A provider whose every call fails after being recorded
    pub(crate) fn failing() -> Self {
        Self {
            failing_operations: Operation::all().to_vec(),
            ..Self::new()
        }
    }

    pub(crate) fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for StubRemoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteEnhancer for StubRemoteProvider {
    fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteOutcome> {
        let operation = request.operation;
        self.calls.lock().unwrap().push(operation.as_str().to_string());

        if self.failing_operations.contains(&operation) {
            return Err(EnhancementError::remote_service(format!(
                "stub provider rejected {operation}"
            )));
        }

        let model = self.catalog.supports(operation).ok_or_else(|| {
            EnhancementError::unsupported_operation(format!("no stub model serves {operation}"))
        })?;

        let (width, height) = (request.image.width(), request.image.height());
        let (image, alpha) = match operation {
            Operation::BackgroundRemoval => {
                (request.image.clone(), Some(soft_square_mask(width, height)))
            },
            Operation::Upscaling => {
                let cap = model.max_output_dimension.max(1);
                let factor = (f64::from(cap) / f64::from(width.max(height)))
                    .min(2.0)
                    .max(1.0);
                let w = ((f64::from(width) * factor).round() as u32).max(1);
                let h = ((f64::from(height) * factor).round() as u32).max(1);
                (request.image.resize_exact(w, h, FilterType::Triangle), None)
            },
            Operation::Lighting => (
                DynamicImage::ImageRgba8(image::imageops::brighten(&request.image.to_rgba8(), 15)),
                None,
            ),
        };

        Ok(RemoteOutcome {
            image,
            alpha,
            cost_usd: model.cost_per_call,
            latency_ms: 3,
            model_id: model.model_id.clone(),
        })
    }
}

/// Full-weight mask over the central half of the frame with zero borders
fn soft_square_mask(width: u32, height: u32) -> AlphaMask {
    let mut data = vec![0u8; (width * height) as usize];
    let x0 = width / 4;
    let y0 = height / 4;
    for y in y0..(height - y0) {
        for x in x0..(width - x0) {
            data[(y * width + x) as usize] = 255;
        }
    }
    AlphaMask::new(data, (width, height))
}
