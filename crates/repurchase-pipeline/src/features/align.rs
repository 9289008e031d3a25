//! Train/serving column alignment.
//!
//! A model is trained on one column layout; at serving time the observed
//! country set (and therefore the one-hot column set) can differ. A
//! [`FeatureSchema`] captures the training layout once and is applied as a
//! pure projection afterward.

use crate::error::Result;
use crate::schema::COUNTRY_FEATURE_PREFIX;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// An ordered snapshot of a feature matrix's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Capture the column layout of a training-time feature matrix.
    pub fn from_frame(df: &DataFrame) -> Self {
        Self {
            columns: df
                .get_column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Build a schema from an explicit ordered column list.
    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Reference one-hot country columns, in schema order.
    fn country_columns(&self) -> impl Iterator<Item = &String> {
        self.columns
            .iter()
            .filter(|c| c.starts_with(COUNTRY_FEATURE_PREFIX))
    }
}

/// Project a feature matrix onto a reference schema:
///
/// 1. reference country columns absent here are added as all-zero;
/// 2. country columns absent from the reference are dropped;
/// 3. the reference column order is applied, restricted to columns that now
///    exist in the matrix.
pub(super) fn align_to_reference(df: DataFrame, reference: &FeatureSchema) -> Result<DataFrame> {
    let mut out = df;
    let rows = out.height();

    let present: HashSet<String> = out
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut added = 0usize;
    for column in reference.country_columns() {
        if !present.contains(column) {
            let zeros = Series::new(column.as_str().into(), vec![0.0f64; rows]);
            out.with_column(zeros)?;
            added += 1;
        }
    }

    let reference_countries: HashSet<&str> = reference
        .country_columns()
        .map(|s| s.as_str())
        .collect();
    let extra: Vec<String> = out
        .get_column_names()
        .into_iter()
        .filter(|c| {
            c.starts_with(COUNTRY_FEATURE_PREFIX) && !reference_countries.contains(c.as_str())
        })
        .map(|s| s.to_string())
        .collect();
    for column in &extra {
        out = out.drop(column)?;
    }

    let present: HashSet<String> = out
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let ordered: Vec<&str> = reference
        .columns()
        .iter()
        .filter(|c| present.contains(*c))
        .map(|s| s.as_str())
        .collect();

    debug!(
        "Aligned features to reference: +{} zero country columns, -{} extra",
        added,
        extra.len()
    );

    Ok(out.select(ordered)?)
}
