//! End-to-end orchestration: raw transactions in, aligned train/test
//! feature and label tables out.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, ResultExt};
use crate::features::{FeatureEngineer, FeatureSchema};
use crate::labels::Labeler;
use crate::preprocess::Preprocessor;
use crate::split::{CustomerSplit, Splitter};
use polars::prelude::*;
use tracing::info;

/// Everything a downstream trainer needs from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub train_features: DataFrame,
    pub test_features: DataFrame,
    pub train_labels: DataFrame,
    pub test_labels: DataFrame,
    /// Training-time column layout; apply to any future scoring matrix.
    pub schema: FeatureSchema,
    pub split: CustomerSplit,
}

/// Runs preprocessing, labeling, splitting, and feature engineering as one
/// unit so every stage reads the same preprocessed snapshot.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline on a raw transaction table.
    ///
    /// Features and labels on each side are keyed and sorted by customer id,
    /// and the test feature matrix is aligned to the training layout.
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutput> {
        info!("Pipeline start: {} raw rows", raw.height());

        let transactions = Preprocessor::basic_preprocessing(raw, self.config.cutoff_date)
            .context("During preprocessing")?;

        let labels = Labeler::create_labels(&transactions, self.config.prediction_window_days)
            .context("During labeling")?;

        let split =
            Splitter::split_customers(&transactions, self.config.test_fraction, self.config.seed)
                .context("During customer split")?;

        let (train_tx, test_tx) = Splitter::partition(&transactions, &split)?;
        let (train_labels, test_labels) = Splitter::partition(&labels, &split)?;

        let engineer = FeatureEngineer::new(self.config.reference_date);
        let train_features = engineer
            .create_all_features(&train_tx, None)
            .context("During train feature engineering")?;
        let schema = FeatureSchema::from_frame(&train_features);
        let test_features = engineer
            .create_all_features(&test_tx, Some(&schema))
            .context("During test feature engineering")?;

        info!(
            "Pipeline done: {} train / {} test customers, {} feature columns",
            train_features.height(),
            test_features.height(),
            schema.columns().len() - 1
        );

        Ok(PipelineOutput {
            train_features,
            test_features,
            train_labels,
            test_labels,
            schema,
            split,
        })
    }
}
