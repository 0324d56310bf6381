//! Local processing stages
//!
//! Each stage is a pure function from image to image (background removal
//! also yields a mask). The pipeline chooses which stages to run and in
//! what order; stages themselves know nothing about routing, masks, or
//! budgets.

pub mod background;
pub mod color;
pub mod denoise;
pub mod lighting;
pub mod sharpen;
pub mod upscale;

/// One planned unit of work, with the parameters the planner chose
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageKind {
    /// Segment the product and replace the background
    BackgroundRemoval,
    /// Exposure shift, local contrast, and color balance
    Lighting,
    /// Noise reduction at the given filter strength
    Denoise { strength: f64 },
    /// Resolution increase by the given factor
    Upscale { factor: f64 },
    /// Unsharp sharpening at the given strength
    Sharpen { strength: f32 },
    /// Local contrast enhancement
    Contrast,
    /// Saturation adjustment toward the given factor
    Saturation { factor: f32 },
}

impl StageKind {
    /// Stable label used in step records
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "background_removal",
            Self::Lighting => "lighting",
            Self::Denoise { .. } => "denoise",
            Self::Upscale { .. } => "upscaling",
            Self::Sharpen { .. } => "sharpen",
            Self::Contrast => "contrast",
            Self::Saturation { .. } => "saturation",
        }
    }

    /// Whether this stage changes image dimensions
    #[must_use]
    pub fn resizes(&self) -> bool {
        matches!(self, Self::Upscale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_are_stable() {
        assert_eq!(StageKind::BackgroundRemoval.name(), "background_removal");
        assert_eq!(StageKind::Upscale { factor: 2.0 }.name(), "upscaling");
        assert_eq!(StageKind::Denoise { strength: 10.0 }.name(), "denoise");
        assert_eq!(StageKind::Saturation { factor: 1.05 }.name(), "saturation");
    }

    #[test]
    fn test_only_upscale_resizes() {
        assert!(StageKind::Upscale { factor: 2.0 }.resizes());
        assert!(!StageKind::Lighting.resizes());
        assert!(!StageKind::Sharpen { strength: 1.5 }.resizes());
    }
}
