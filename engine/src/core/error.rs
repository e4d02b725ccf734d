//! SurfMark Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::{SurferId, TimeSec};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Surfer not found: {0}")]
    SurferNotFound(SurferId),

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid quality rating: {0} (expected poor, average, good or excellent)")]
    InvalidQuality(String),

    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    // =========================================================================
    // File Errors
    // =========================================================================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported video format: {0}")]
    UnsupportedVideoFormat(String),

    #[error("FFprobe error: {0}")]
    FFprobeError(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns true when the error means a referenced surfer or file is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::SurferNotFound(_) | CoreError::FileNotFound(_))
    }

    /// Returns true when the error is a rejected value rather than an I/O failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidBoundingBox(_)
                | CoreError::InvalidQuality(_)
                | CoreError::InvalidTimeRange(_, _)
                | CoreError::ValidationError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CoreError::SurferNotFound(3).is_not_found());
        assert!(CoreError::FileNotFound("a.json".to_string()).is_not_found());
        assert!(!CoreError::ValidationError("x".to_string()).is_not_found());

        assert!(CoreError::InvalidTimeRange(25.0, 10.0).is_validation());
        assert!(CoreError::InvalidQuality("great".to_string()).is_validation());
        assert!(!CoreError::Internal("boom".to_string()).is_validation());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CoreError::SurferNotFound(7).to_string(), "Surfer not found: 7");
        assert_eq!(
            CoreError::InvalidTimeRange(25.0, 10.0).to_string(),
            "Invalid time range: 25~10 seconds"
        );
    }
}
