//! Custom error types for the repurchase pipeline.
//!
//! Two fatal error families exist: [`DataFormatError`] for malformed input
//! (unparsable timestamps, missing or mistyped raw columns) and
//! [`FeatureComputationError`] for feature-time schema violations. Everything
//! else that can go wrong in a stage is wrapped by [`PipelineError`].
//!
//! Soft conditions (rows dropped for a missing customer id, nulls filled
//! after the feature merge) are logged, never raised.

use thiserror::Error;

/// Malformed or mistyped raw input. Fatal; aborts the stage.
#[derive(Error, Debug)]
pub enum DataFormatError {
    /// A required raw column is absent from the input table.
    #[error("Required column '{0}' not found in transaction data")]
    MissingColumn(String),

    /// An invoice timestamp could not be parsed with any supported format.
    #[error("Could not parse timestamp '{value}' in column '{column}'")]
    UnparsableTimestamp { column: String, value: String },

    /// A column could not be coerced to its canonical type.
    #[error("Could not coerce column '{column}' to {target_type}: {reason}")]
    InvalidColumnType {
        column: String,
        target_type: String,
        reason: String,
    },
}

/// A required column is missing at feature-computation time. Fatal.
#[derive(Error, Debug)]
pub enum FeatureComputationError {
    #[error("Feature computation requires column '{0}', which is missing")]
    MissingColumn(String),
}

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Raw input failed validation or parsing.
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    /// The transaction table was unusable at feature time.
    #[error(transparent)]
    FeatureComputation(#[from] FeatureComputationError),

    /// Invalid parameter supplied to a stage.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (e.g., an aggregation produced an unexpected shape).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error came from malformed raw input.
    pub fn is_data_format(&self) -> bool {
        match self {
            Self::DataFormat(_) => true,
            Self::WithContext { source, .. } => source.is_data_format(),
            _ => false,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_preserves_source() {
        let error = PipelineError::from(DataFormatError::MissingColumn("quantity".to_string()))
            .with_context("During preprocessing");
        assert!(error.to_string().contains("During preprocessing"));
        assert!(error.is_data_format());
    }

    #[test]
    fn test_data_format_display() {
        let error = DataFormatError::UnparsableTimestamp {
            column: "invoice_date".to_string(),
            value: "not-a-date".to_string(),
        };
        assert!(error.to_string().contains("not-a-date"));
        assert!(error.to_string().contains("invoice_date"));
    }

    #[test]
    fn test_feature_error_wraps() {
        let error =
            PipelineError::from(FeatureComputationError::MissingColumn("country".to_string()));
        assert!(!error.is_data_format());
        assert!(error.to_string().contains("country"));
    }
}
