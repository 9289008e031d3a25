//! Binary future-purchase labels.
//!
//! A customer's label answers "did they transact again inside the last
//! `prediction_window_days` of the observed data". The window is anchored at
//! the global maximum invoice timestamp, not at each customer's own history;
//! labels describe activity before the shared data horizon.

use crate::error::Result;
use crate::schema::{CUSTOMER_ID, INVOICE_DATE, LAST_PURCHASE_DATE, WILL_PURCHASE};
use crate::utils::{timestamp_ms_values, MS_PER_DAY};
use polars::prelude::*;
use tracing::{info, warn};

/// Derives the per-customer label table from a preprocessed transaction table.
pub struct Labeler;

impl Labeler {
    /// Build the label table: one row per customer with their latest purchase
    /// timestamp and `will_purchase` ∈ {0, 1}.
    ///
    /// `will_purchase = 1` iff the customer has a transaction strictly after
    /// `max(invoice_date) - prediction_window_days`. A customer's latest
    /// purchase is enough to decide this, since any window transaction puts
    /// the maximum inside the window too.
    ///
    /// An empty transaction table yields an empty label table.
    pub fn create_labels(df: &DataFrame, prediction_window_days: i64) -> Result<DataFrame> {
        if df.height() == 0 {
            warn!("Empty transaction table; producing an empty label table");
            return empty_label_table();
        }

        let per_customer = df
            .clone()
            .lazy()
            .group_by([col(CUSTOMER_ID)])
            .agg([col(INVOICE_DATE).max().alias(LAST_PURCHASE_DATE)])
            .sort([CUSTOMER_ID], SortMultipleOptions::default())
            .collect()?;

        let last_purchase_ms =
            timestamp_ms_values(per_customer.column(LAST_PURCHASE_DATE)?.as_materialized_series())?;
        let max_ms = last_purchase_ms.iter().flatten().copied().max();
        let Some(max_ms) = max_ms else {
            warn!("No valid purchase timestamps; producing an empty label table");
            return empty_label_table();
        };
        let prediction_cutoff_ms = max_ms - prediction_window_days * MS_PER_DAY;

        let labels: Vec<i32> = last_purchase_ms
            .iter()
            .map(|ms| match ms {
                Some(ms) if *ms > prediction_cutoff_ms => 1,
                _ => 0,
            })
            .collect();
        let positives = labels.iter().filter(|&&l| l == 1).count();

        let mut labeled = per_customer;
        labeled.with_column(Series::new(WILL_PURCHASE.into(), labels))?;

        info!(
            "Labeled {} customers, {} positive ({:.1}%)",
            labeled.height(),
            positives,
            100.0 * positives as f64 / labeled.height() as f64
        );

        Ok(labeled)
    }
}

fn empty_label_table() -> Result<DataFrame> {
    let columns = vec![
        Series::new_empty(CUSTOMER_ID.into(), &DataType::Int64).into_column(),
        Series::new_empty(
            LAST_PURCHASE_DATE.into(),
            &DataType::Datetime(TimeUnit::Milliseconds, None),
        )
        .into_column(),
        Series::new_empty(WILL_PURCHASE.into(), &DataType::Int32).into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}
