//! Error types for model evaluation.

use thiserror::Error;

/// Errors raised while validating evaluation inputs or resolving models.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The label, prediction, and probability arrays must be index-aligned.
    #[error("Input length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Metrics over zero observations are meaningless.
    #[error("Cannot evaluate an empty input")]
    EmptyInput,

    /// A true label was neither 0 nor 1.
    #[error("Invalid label value {value} at index {index} (labels must be 0 or 1)")]
    InvalidLabel { index: usize, value: u8 },

    /// The registry has no model under the requested name.
    #[error("No model registered under '{0}'")]
    UnknownModel(String),
}

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = EvalError::LengthMismatch {
            expected: 10,
            actual: 7,
        };
        assert!(error.to_string().contains("10"));
        assert!(error.to_string().contains("7"));
    }
}
