//! Error types for enhancement operations

use thiserror::Error;

/// Result type alias for enhancement operations
pub type Result<T> = std::result::Result<T, EnhancementError>;

/// Comprehensive error types for enhancement operations
#[derive(Error, Debug)]
pub enum EnhancementError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Undecodable, empty, or degenerate input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Remote provider transport, timeout, or payload errors
    #[error("Remote service error: {0}")]
    RemoteService(String),

    /// Operation not supported by the selected provider catalog
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A local transform failed
    #[error("Processing error: {0}")]
    Processing(String),

    /// Run cancelled cooperatively between stages
    #[error("Enhancement cancelled: {0}")]
    Cancelled(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnhancementError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new remote service error
    pub fn remote_service<S: Into<String>>(msg: S) -> Self {
        Self::RemoteService(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported_operation<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    // Enhanced contextual error creators

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {rec}"),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {parameter}: {value} (valid range: {valid_range}).{recommendation}"
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {info})"),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{stage}'{input_context}: {details}"
        ))
    }

    /// Create remote service error with provider context
    pub fn remote_error_with_provider(provider: &str, operation: &str, error: &str) -> Self {
        Self::RemoteService(format!("{operation} failed using '{provider}': {error}"))
    }

    /// True when the error class is recoverable through local fallback
    #[must_use]
    pub fn is_remote_recoverable(&self) -> bool {
        matches!(self, Self::RemoteService(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EnhancementError::invalid_config("test config error");
        assert!(matches!(err, EnhancementError::InvalidConfig(_)));

        let err = EnhancementError::unsupported_operation("inpainting");
        assert!(matches!(err, EnhancementError::UnsupportedOperation(_)));

        let err = EnhancementError::invalid_input("empty buffer");
        assert!(matches!(err, EnhancementError::InvalidInput(_)));
    }

    #[test]
    fn test_error_display() {
        let err = EnhancementError::invalid_config("budget must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: budget must be positive"
        );

        let err = EnhancementError::remote_service("connection refused");
        assert_eq!(err.to_string(), "Remote service error: connection refused");
    }

    #[test]
    fn test_config_value_error_context() {
        let err = EnhancementError::config_value_error("jpeg_quality", 150, "0-100", Some(85));
        let error_string = err.to_string();
        assert!(error_string.contains("jpeg_quality"));
        assert!(error_string.contains("150"));
        assert!(error_string.contains("0-100"));
        assert!(error_string.contains("Recommended: 85"));
    }

    #[test]
    fn test_processing_stage_error_context() {
        let err = EnhancementError::processing_stage_error(
            "denoise",
            "zero-sized luma plane",
            Some("1920x1080 RGB"),
        );
        let error_string = err.to_string();
        assert!(error_string.contains("denoise"));
        assert!(error_string.contains("1920x1080 RGB"));
    }

    #[test]
    fn test_remote_recoverable_classification() {
        assert!(EnhancementError::remote_service("timeout").is_remote_recoverable());
        assert!(!EnhancementError::processing("bad buffer").is_remote_recoverable());
        assert!(!EnhancementError::invalid_input("empty").is_remote_recoverable());
    }
}
