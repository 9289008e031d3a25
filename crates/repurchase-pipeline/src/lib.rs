//! Repeat-Purchase Prediction Pipeline Library
//!
//! Turns raw retail transaction logs into temporally-consistent,
//! per-customer feature matrices with matching binary labels, ready for any
//! classifier.
//!
//! # Overview
//!
//! The pipeline runs four stages over one shared transaction snapshot:
//!
//! - **Preprocessing**: timestamp parsing, return normalization, cutoff
//!   filtering ([`Preprocessor`])
//! - **Labeling**: binary "will purchase again" labels anchored at the
//!   global data horizon ([`Labeler`])
//! - **Splitting**: deterministic, customer-disjoint train/test partitions
//!   ([`Splitter`])
//! - **Feature engineering**: six per-customer feature groups merged into
//!   one wide matrix, with train/serving column alignment
//!   ([`FeatureEngineer`], [`FeatureSchema`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use repurchase_pipeline::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let raw = CsvReader::from_path("transactions.csv")?.finish()?;
//!
//! let config = PipelineConfig::builder()
//!     .cutoff_date("2011-09-01")
//!     .prediction_window_days(30)
//!     .test_fraction(0.2)
//!     .seed(42)
//!     .build()?;
//!
//! let output = Pipeline::new(config)?.run(&raw)?;
//! println!("{} train customers", output.train_features.height());
//! ```
//!
//! The stages are also usable on their own; serving code typically calls
//! [`FeatureEngineer::create_all_features`] with the training-time
//! [`FeatureSchema`] to keep the scoring matrix shape identical to training.

pub mod config;
pub mod error;
pub mod features;
pub mod labels;
pub mod pipeline;
pub mod preprocess;
pub mod schema;
pub mod split;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{
    DataFormatError, FeatureComputationError, PipelineError, Result, ResultExt,
};
pub use features::{FeatureEngineer, FeatureSchema};
pub use labels::Labeler;
pub use pipeline::{Pipeline, PipelineOutput};
pub use preprocess::Preprocessor;
pub use split::{CustomerSplit, Splitter};
