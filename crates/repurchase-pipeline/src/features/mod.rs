//! Per-customer feature engineering.
//!
//! Six feature groups, each keyed by customer id, left-joined into one wide
//! row-per-customer matrix:
//!
//! - RFM: recency, frequency, monetary value
//! - basket diversity: product variety and basket shape
//! - momentum: spend and transaction counts in recent windows
//! - returns: return counts, rates and amounts
//! - geographic: one-hot primary country
//! - temporal: day-of-week / month habits and customer lifetime
//!
//! All feature columns are Float64 and null-free in the output; gaps left by
//! the joins are filled with 0. With a [`FeatureSchema`] the output is
//! projected onto a training-time column layout so models see an
//! identically-shaped matrix at serving time.

mod align;
mod basket;
mod geographic;
mod momentum;
mod returns;
mod rfm;
mod temporal;

pub use align::FeatureSchema;
pub use basket::{AVG_BASKET_SIZE, AVG_BASKET_VALUE, UNIQUE_DESCRIPTIONS, UNIQUE_PRODUCTS};
pub use momentum::{
    FREQ_30D, FREQ_90D, SPEND_30D, SPEND_90D, SPEND_RATIO_30D_90D, SPEND_RATIO_90D_180D,
    TRANSACTIONS_30D, TRANSACTIONS_90D,
};
pub use returns::{NET_AMOUNT, RETURN_AMOUNT, RETURN_RATE, TOTAL_RETURNS};
pub use rfm::{
    FREQUENCY, MONETARY, RECENCY_DAYS, TOTAL_MONETARY, TOTAL_TRANSACTIONS, UNIQUE_INVOICES,
};
pub use temporal::{
    AVG_DAY_OF_WEEK, AVG_MONTH, CUSTOMER_LIFETIME_DAYS, STD_DAY_OF_WEEK, STD_MONTH, WEEKEND_RATIO,
};

/// Every fixed feature column, in group order. The one-hot `country_*` block
/// is data-dependent and not listed; it sits between the returns and
/// temporal groups in the merged output.
pub const FEATURE_NAMES: [&str; 28] = [
    // RFM
    RECENCY_DAYS,
    FREQUENCY,
    MONETARY,
    TOTAL_MONETARY,
    TOTAL_TRANSACTIONS,
    UNIQUE_INVOICES,
    // basket diversity
    UNIQUE_PRODUCTS,
    UNIQUE_DESCRIPTIONS,
    AVG_BASKET_SIZE,
    AVG_BASKET_VALUE,
    // momentum
    SPEND_30D,
    SPEND_90D,
    SPEND_RATIO_30D_90D,
    SPEND_RATIO_90D_180D,
    FREQ_30D,
    FREQ_90D,
    TRANSACTIONS_30D,
    TRANSACTIONS_90D,
    // returns
    TOTAL_RETURNS,
    RETURN_RATE,
    RETURN_AMOUNT,
    NET_AMOUNT,
    // temporal
    AVG_DAY_OF_WEEK,
    STD_DAY_OF_WEEK,
    AVG_MONTH,
    STD_MONTH,
    WEEKEND_RATIO,
    CUSTOMER_LIFETIME_DAYS,
];

use crate::error::{FeatureComputationError, Result};
use crate::schema::{CUSTOMER_ID, REQUIRED_RAW_COLUMNS};
use crate::utils::{datetime_to_ms, fill_numeric_nulls};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::info;

/// Builds the per-customer feature matrix.
///
/// All time-windowed features are anchored at `reference_date`; every run
/// feeding one model must use the same anchor.
pub struct FeatureEngineer {
    reference_date: NaiveDateTime,
}

impl FeatureEngineer {
    pub fn new(reference_date: NaiveDateTime) -> Self {
        Self { reference_date }
    }

    /// Compute every feature group and merge them into one matrix, sorted by
    /// customer id, one row per customer.
    ///
    /// When `reference` is given, the output is aligned to that schema (see
    /// [`FeatureSchema`]): reference country columns missing here are added
    /// as zeros, country columns unknown to the reference are dropped, and
    /// the reference column order is applied.
    pub fn create_all_features(
        &self,
        df: &DataFrame,
        reference: Option<&FeatureSchema>,
    ) -> Result<DataFrame> {
        ensure_feature_columns(df)?;

        let reference_ms = datetime_to_ms(self.reference_date);

        let rfm = rfm::build(df, reference_ms)?;
        let diversity = basket::build(df)?;
        let momentum = momentum::build(df, reference_ms)?;
        let returns = returns::build(df)?;
        let geographic = geographic::build(df)?;
        let temporal = temporal::build(df)?;

        let mut merged = rfm;
        for group in [diversity, momentum, returns, geographic, temporal] {
            merged = merged
                .lazy()
                .join(
                    group.lazy(),
                    [col(CUSTOMER_ID)],
                    [col(CUSTOMER_ID)],
                    JoinArgs::new(JoinType::Left),
                )
                .collect()?;
        }

        let mut features = fill_feature_nulls(merged)?;
        if let Some(reference) = reference {
            features = align::align_to_reference(features, reference)?;
        }

        info!(
            "Created {} feature columns for {} customers",
            features.width() - 1,
            features.height()
        );
        Ok(features)
    }
}

fn ensure_feature_columns(df: &DataFrame) -> Result<()> {
    let present: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for required in REQUIRED_RAW_COLUMNS {
        if !present.contains(required) {
            return Err(FeatureComputationError::MissingColumn(required.to_string()).into());
        }
    }
    Ok(())
}

/// Cast every feature column to Float64 and fill join gaps with 0. The
/// customer id keeps its integer identity.
fn fill_feature_nulls(df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let mut out = df;
    for name in names {
        if name == CUSTOMER_ID {
            continue;
        }
        let filled = fill_numeric_nulls(out.column(&name)?.as_materialized_series(), 0.0)?;
        out.with_column(filled)?;
    }
    Ok(out)
}

/// Extract a column as f64 values with nulls as 0.
pub(crate) fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?.as_materialized_series();
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Group a transaction table by customer, sorted by customer id.
pub(crate) fn group_by_customer(df: &DataFrame, aggs: Vec<Expr>) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .group_by([col(CUSTOMER_ID)])
        .agg(aggs)
        .sort([CUSTOMER_ID], SortMultipleOptions::default())
        .collect()?)
}
