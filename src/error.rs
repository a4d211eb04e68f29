//! Error handling for rainfall analysis operations.
//!
//! Provides error types with context for dataset loading, trend computation,
//! chart rendering and configuration failures. Every variant belongs to one
//! [`ErrorCategory`] so callers can tell "no data" apart from "malformed data"
//! and from an internal fault.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RainflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset not found at path: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("Required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("Column '{column}' is not numeric: {reason}")]
    NonNumericColumn { column: String, reason: String },

    #[error("Unparseable timestamp at row {row}: '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("No dataset loaded")]
    NoDataset,

    #[error("Column '{column}' has no values to summarise")]
    NoValues { column: String },

    #[error("Unsupported chart kind: {kind}")]
    UnsupportedChart { kind: String },

    #[error("Chart rendering failed: {reason}")]
    Render { reason: String },

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse failure classes surfaced at the transport boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resource unreadable, malformed, or missing the required column
    Load,
    /// Fault while computing trends over a loaded table
    Compute,
    /// Chart unsupported, inapplicable, or failed to draw
    Render,
    /// Invalid configuration
    Config,
    /// Filesystem or serialisation failure outside the analysis itself
    Io,
}

impl RainflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RainflowError::Polars(_)
            | RainflowError::DatasetNotFound { .. }
            | RainflowError::MissingColumn { .. }
            | RainflowError::NonNumericColumn { .. }
            | RainflowError::InvalidTimestamp { .. } => ErrorCategory::Load,
            RainflowError::NoValues { .. } => ErrorCategory::Compute,
            RainflowError::NoDataset
            | RainflowError::UnsupportedChart { .. }
            | RainflowError::Render { .. }
            | RainflowError::Encoding(_) => ErrorCategory::Render,
            RainflowError::Configuration { .. } => ErrorCategory::Config,
            RainflowError::Io(_) | RainflowError::Json(_) => ErrorCategory::Io,
        }
    }

    /// Wrap any drawing backend error
    pub fn render(reason: impl std::fmt::Display) -> Self {
        Self::Render {
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RainflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let missing = RainflowError::MissingColumn {
            column: "rainfall".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Load);
        assert_eq!(
            RainflowError::NoValues {
                column: "rainfall".to_string()
            }
            .category(),
            ErrorCategory::Compute
        );
        assert_eq!(RainflowError::NoDataset.category(), ErrorCategory::Render);
        assert_eq!(
            RainflowError::render("backend closed").category(),
            ErrorCategory::Render
        );
    }

    #[test]
    fn test_display_messages() {
        let err = RainflowError::InvalidTimestamp {
            row: 3,
            value: "not-a-date".to_string(),
        };
        assert_eq!(err.to_string(), "Unparseable timestamp at row 3: 'not-a-date'");

        let err = RainflowError::UnsupportedChart {
            kind: "pie".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported chart kind: pie");
    }
}
