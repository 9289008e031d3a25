//! Recency / frequency / monetary features.

use super::{column_f64, group_by_customer};
use crate::error::Result;
use crate::schema::{CUSTOMER_ID, INVOICE_DATE, INVOICE_ID, TOTAL_AMOUNT};
use crate::utils::{timestamp_ms_values, MS_PER_DAY};
use polars::prelude::*;

pub const RECENCY_DAYS: &str = "recency_days";
pub const FREQUENCY: &str = "frequency";
pub const MONETARY: &str = "monetary";
pub const TOTAL_MONETARY: &str = "total_monetary";
pub const TOTAL_TRANSACTIONS: &str = "total_transactions";
pub const UNIQUE_INVOICES: &str = "unique_invoices";

const LAST_PURCHASE: &str = "last_purchase";

/// Recency is whole days between the reference instant and the customer's
/// latest purchase (floored); monetary is spend per transaction row.
pub(super) fn build(df: &DataFrame, reference_ms: i64) -> Result<DataFrame> {
    let aggregated = group_by_customer(
        df,
        vec![
            col(INVOICE_DATE).max().alias(LAST_PURCHASE),
            col(INVOICE_DATE).count().alias(TOTAL_TRANSACTIONS),
            col(TOTAL_AMOUNT).sum().alias(TOTAL_MONETARY),
            col(INVOICE_ID).n_unique().alias(UNIQUE_INVOICES),
        ],
    )?;

    let last_ms = timestamp_ms_values(aggregated.column(LAST_PURCHASE)?.as_materialized_series())?;
    let recency: Vec<f64> = last_ms
        .iter()
        .map(|ms| match ms {
            Some(ms) => ((reference_ms - ms).div_euclid(MS_PER_DAY)) as f64,
            None => 0.0,
        })
        .collect();

    let transactions = column_f64(&aggregated, TOTAL_TRANSACTIONS)?;
    let totals = column_f64(&aggregated, TOTAL_MONETARY)?;
    let monetary: Vec<f64> = totals
        .iter()
        .zip(&transactions)
        .map(|(total, count)| if *count > 0.0 { total / count } else { 0.0 })
        .collect();

    let mut out = aggregated;
    out.with_column(Series::new(RECENCY_DAYS.into(), recency))?;
    // Frequency mirrors the raw transaction count as a float feature.
    out.with_column(Series::new(FREQUENCY.into(), transactions))?;
    out.with_column(Series::new(MONETARY.into(), monetary))?;

    Ok(out.select([
        CUSTOMER_ID,
        RECENCY_DAYS,
        FREQUENCY,
        MONETARY,
        TOTAL_MONETARY,
        TOTAL_TRANSACTIONS,
        UNIQUE_INVOICES,
    ])?)
}
