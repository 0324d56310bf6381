//! Image I/O operations service
//!
//! This module separates file and byte-stream decoding from the
//! enhancement logic, making the system more testable and maintainable.

use crate::error::{EnhancementError, Result};
use image::DynamicImage;
use std::path::Path;

/// Service for handling image input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the image file
    ///
    /// # Returns
    /// * `Ok(DynamicImage)` - Successfully loaded image
    /// * `Err(EnhancementError)` - Missing file or undecodable content
    ///
    /// # Examples
    /// ```rust,no_run
    /// use pixlift::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("input.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(EnhancementError::invalid_input(format!(
                "image file does not exist: {}",
                path_ref.display()
            )));
        }

        // Extension-based loading first, content-based detection second
        match image::open(path_ref) {
            Ok(img) => Self::validated(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );
                let data = std::fs::read(path_ref)?;
                match image::load_from_memory(&data) {
                    Ok(img) => Self::validated(img),
                    Err(content_err) => Err(EnhancementError::processing_stage_error(
                        "image loading",
                        &format!(
                            "failed with both extension-based and content-based detection. Extension error: {e}. Content error: {content_err}"
                        ),
                        Some(&format!(
                            "path: {}, size: {} bytes",
                            path_ref.display(),
                            data.len()
                        )),
                    )),
                }
            },
        }
    }

    /// Decode an image from raw bytes
    ///
    /// # Arguments
    /// * `bytes` - Encoded image payload (JPEG, PNG, WebP, ...)
    ///
    /// # Returns
    /// * `Ok(DynamicImage)` - Successfully decoded image
    /// * `Err(EnhancementError)` - Empty or undecodable payload
    pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(EnhancementError::invalid_input("empty image payload"));
        }
        let img = image::load_from_memory(bytes)?;
        Self::validated(img)
    }

    /// Write already-encoded bytes to a file
    ///
    /// # Arguments
    /// * `bytes` - Encoded image payload
    /// * `path` - Output file path
    pub fn write_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        std::fs::write(path.as_ref(), bytes)?;
        log::debug!(
            "Wrote {} bytes to {}",
            bytes.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    fn validated(img: DynamicImage) -> Result<DynamicImage> {
        if img.width() == 0 || img.height() == 0 {
            return Err(EnhancementError::invalid_input(
                "image has zero width or height",
            ));
        }
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([120, 10, 200, 255]),
        ));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .expect("png encode");
        cursor.into_inner()
    }

    #[test]
    fn test_decode_round_trip() {
        let img = ImageIOService::decode_image(&png_bytes()).expect("decode");
        assert_eq!(img.width(), 8);
        assert_eq!(img.to_rgba8().get_pixel(2, 2).0[2], 200);
    }

    #[test]
    fn test_decode_empty_payload_rejected() {
        let err = ImageIOService::decode_image(&[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_decode_garbage_rejected() {
        assert!(ImageIOService::decode_image(&[0x00, 0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn test_load_missing_file_rejected() {
        let err = ImageIOService::load_image("/nonexistent/path/image.png").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_by_content_despite_wrong_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("actually_png.jpg");
        std::fs::write(&path, png_bytes()).expect("write fixture");
        let img = ImageIOService::load_image(&path).expect("content-based load");
        assert_eq!(img.width(), 8);
    }

    #[test]
    fn test_write_bytes_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.png");
        ImageIOService::write_bytes(&png_bytes(), &path).expect("write");
        let img = ImageIOService::load_image(&path).expect("reload");
        assert_eq!(img.height(), 8);
    }
}
