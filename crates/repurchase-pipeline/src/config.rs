//! Configuration for the repurchase pipeline.
//!
//! Uses the builder pattern; date parameters are accepted as strings and
//! parsed at `build()` time so a config can come straight from CLI flags or
//! JSON.

use crate::utils::parse_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Configuration for a full pipeline run.
///
/// Use [`PipelineConfig::builder()`] for a fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use repurchase_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .cutoff_date("2011-09-01")
///     .prediction_window_days(30)
///     .test_fraction(0.2)
///     .seed(42)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// "Data as of" horizon. Transactions after this instant are discarded
    /// during preprocessing so training features cannot see the future.
    pub cutoff_date: NaiveDateTime,

    /// Anchor for recency and momentum windows. Every feature run for one
    /// model must use the same reference date.
    pub reference_date: NaiveDateTime,

    /// Forward-looking span (days) that defines the positive label.
    /// Default: 30
    pub prediction_window_days: i64,

    /// Share of customers held out for the test set (0.0 - 1.0, exclusive).
    /// Default: 0.2
    pub test_fraction: f64,

    /// Seed for the customer split.
    /// Default: 42
    pub seed: u64,
}

/// Original dataset horizon, kept as the default anchor.
const DEFAULT_ANCHOR: &str = "2011-09-01";

impl Default for PipelineConfig {
    fn default() -> Self {
        // The default anchor string is a valid date; parse cannot fail.
        let anchor = parse_timestamp(DEFAULT_ANCHOR).unwrap_or_default();
        Self {
            cutoff_date: anchor,
            reference_date: anchor,
            prediction_window_days: 30,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigValidationError::InvalidFraction(self.test_fraction));
        }
        if self.prediction_window_days < 1 {
            return Err(ConfigValidationError::InvalidWindow(
                self.prediction_window_days,
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid test fraction: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction(f64),

    #[error("Invalid prediction window: {0} days (must be at least 1)")]
    InvalidWindow(i64),

    #[error("Invalid date for '{field}': '{value}' (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    InvalidDate { field: String, value: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    cutoff_date: Option<String>,
    reference_date: Option<String>,
    prediction_window_days: Option<i64>,
    test_fraction: Option<f64>,
    seed: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the preprocessing cutoff ("data as of" date).
    pub fn cutoff_date(mut self, date: impl Into<String>) -> Self {
        self.cutoff_date = Some(date.into());
        self
    }

    /// Set the feature reference date (recency/momentum anchor).
    pub fn reference_date(mut self, date: impl Into<String>) -> Self {
        self.reference_date = Some(date.into());
        self
    }

    /// Set the prediction window length in days.
    pub fn prediction_window_days(mut self, days: i64) -> Self {
        self.prediction_window_days = Some(days);
        self
    }

    /// Set the held-out customer share.
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }

    /// Set the split seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if a date fails to
    /// parse or a numeric parameter is out of range.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();

        let cutoff_date = match self.cutoff_date {
            Some(raw) => parse_date_field("cutoff_date", &raw)?,
            None => defaults.cutoff_date,
        };
        let reference_date = match self.reference_date {
            Some(raw) => parse_date_field("reference_date", &raw)?,
            None => defaults.reference_date,
        };

        let config = PipelineConfig {
            cutoff_date,
            reference_date,
            prediction_window_days: self
                .prediction_window_days
                .unwrap_or(defaults.prediction_window_days),
            test_fraction: self.test_fraction.unwrap_or(defaults.test_fraction),
            seed: self.seed.unwrap_or(defaults.seed),
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_date_field(field: &str, raw: &str) -> Result<NaiveDateTime, ConfigValidationError> {
    parse_timestamp(raw).ok_or_else(|| ConfigValidationError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    })
}
