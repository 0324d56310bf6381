//! Output encoding service
//!
//! This module separates encoding and size-target negotiation from the
//! enhancement logic. JPEG output supports a quality descent toward a
//! byte target; PNG and WebP are encoded once at their configured
//! settings since their compression is not driven by a quality scalar
//! (WebP output here is lossless).

use crate::{
    config::{OutputConfig, OutputFormat},
    error::Result,
    types::EncodedOutput,
};
#[cfg(not(feature = "webp-support"))]
use crate::error::EnhancementError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::DynamicImage;
use std::io::Cursor;

/// Quality where the size-target descent starts
const DESCENT_START: u8 = 90;
/// Quality step per descent iteration
const DESCENT_STEP: u8 = 5;

/// Service for encoding enhanced images
pub struct OutputEncoder;

impl OutputEncoder {
    /// Encode an image in the given format
    ///
    /// # Arguments
    /// * `image` - Image to encode
    /// * `format` - Target format
    /// * `quality` - JPEG quality in 1-100 (ignored by PNG and WebP)
    /// * `png_compression` - PNG compression level in 0-9 (ignored otherwise)
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - Encoded payload
    /// * `Err(EnhancementError)` - Encoder failure
    pub fn encode(
        image: &DynamicImage,
        format: OutputFormat,
        quality: u8,
        png_compression: u8,
    ) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha; backgrounds are already composited
                let rgb = image.to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
                rgb.write_with_encoder(encoder)?;
            },
            OutputFormat::Png => {
                let compression = match png_compression {
                    0..=3 => CompressionType::Fast,
                    4..=6 => CompressionType::Default,
                    _ => CompressionType::Best,
                };
                let encoder =
                    PngEncoder::new_with_quality(&mut cursor, compression, PngFilterType::Adaptive);
                image.to_rgba8().write_with_encoder(encoder)?;
            },
            OutputFormat::WebP => {
                #[cfg(feature = "webp-support")]
                {
                    let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut cursor);
                    image.to_rgba8().write_with_encoder(encoder)?;
                }
                #[cfg(not(feature = "webp-support"))]
                {
                    return Err(EnhancementError::unsupported_operation(
                        "webp output requires the webp-support feature",
                    ));
                }
            },
        }
        Ok(cursor.into_inner())
    }

    /// Encode toward the configured size target
    ///
    /// The first attempt uses the configured quality. When the payload
    /// overshoots the target and the format supports a quality scalar,
    /// quality steps down from 90 in increments of 5 until the payload
    /// fits or the quality floor is reached. The result records whether
    /// the target was met.
    ///
    /// # Arguments
    /// * `image` - Image to encode
    /// * `config` - Output settings including format and size target
    pub fn optimize(image: &DynamicImage, config: &OutputConfig) -> Result<EncodedOutput> {
        let initial_quality = match config.format {
            OutputFormat::Jpeg => config.jpeg_quality,
            OutputFormat::WebP => config.webp_quality,
            OutputFormat::Png => 0,
        };
        let bytes = Self::encode(
            image,
            config.format,
            initial_quality,
            config.png_compression,
        )?;

        let target_bytes = match config.target_max_size_kb {
            Some(kb) => u64::from(kb) * 1024,
            None => {
                return Ok(EncodedOutput {
                    bytes,
                    format: config.format,
                    quality: config.format.supports_quality().then_some(initial_quality),
                    size_target_met: true,
                })
            },
        };

        if bytes.len() as u64 <= target_bytes {
            return Ok(EncodedOutput {
                bytes,
                format: config.format,
                quality: config.format.supports_quality().then_some(initial_quality),
                size_target_met: true,
            });
        }

        if !config.format.supports_quality() {
            log::warn!(
                "{} output is {} KB, over the {} KB target, and has no quality scalar to lower",
                config.format,
                bytes.len() / 1024,
                target_bytes / 1024
            );
            return Ok(EncodedOutput {
                bytes,
                format: config.format,
                quality: None,
                size_target_met: false,
            });
        }

        // Quality descent for JPEG
        let floor = config.min_quality.max(1);
        if initial_quality <= floor {
            return Ok(EncodedOutput {
                bytes,
                format: config.format,
                quality: Some(initial_quality),
                size_target_met: false,
            });
        }
        let mut quality = if initial_quality > DESCENT_START {
            DESCENT_START
        } else {
            initial_quality.saturating_sub(DESCENT_STEP).max(floor)
        };
        let mut best = bytes;
        let mut best_quality = initial_quality;
        loop {
            let attempt = Self::encode(image, config.format, quality, config.png_compression)?;
            let fits = attempt.len() as u64 <= target_bytes;
            if attempt.len() < best.len() {
                best = attempt;
                best_quality = quality;
            }
            if fits {
                log::debug!(
                    "Size target met at quality {}: {} KB <= {} KB",
                    quality,
                    best.len() / 1024,
                    target_bytes / 1024
                );
                return Ok(EncodedOutput {
                    bytes: best,
                    format: config.format,
                    quality: Some(quality),
                    size_target_met: true,
                });
            }
            if quality <= floor {
                break;
            }
            quality = quality.saturating_sub(DESCENT_STEP).max(floor);
        }

        log::warn!(
            "Size target not met: {} KB at quality floor {} (target {} KB)",
            best.len() / 1024,
            floor,
            target_bytes / 1024
        );
        Ok(EncodedOutput {
            bytes: best,
            format: config.format,
            quality: Some(best_quality),
            size_target_met: false,
        })
    }
}
