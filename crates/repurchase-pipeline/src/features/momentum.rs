//! Momentum features: spend and transaction activity in recent windows.
//!
//! Windows are anchored at a fixed reference instant, never at "now". The
//! 30d and 90d windows include their lower bound; the previous-90d window is
//! `[reference - 180d, reference - 90d)`.

use super::{column_f64, group_by_customer};
use crate::error::Result;
use crate::schema::{CUSTOMER_ID, INVOICE_DATE, TOTAL_AMOUNT};
use crate::utils::MS_PER_DAY;
use polars::prelude::*;

pub const SPEND_30D: &str = "spend_30d";
pub const SPEND_90D: &str = "spend_90d";
pub const SPEND_RATIO_30D_90D: &str = "spend_ratio_30d_90d";
pub const SPEND_RATIO_90D_180D: &str = "spend_ratio_90d_180d";
pub const FREQ_30D: &str = "freq_30d";
pub const FREQ_90D: &str = "freq_90d";
pub const TRANSACTIONS_30D: &str = "transactions_30d";
pub const TRANSACTIONS_90D: &str = "transactions_90d";

const SPEND_PREV_90D: &str = "spend_prev_90d";

/// Guard against zero denominators in the spend ratios.
const RATIO_EPSILON: f64 = 1e-8;

pub(super) fn build(df: &DataFrame, reference_ms: i64) -> Result<DataFrame> {
    let w30 = reference_ms - 30 * MS_PER_DAY;
    let w90 = reference_ms - 90 * MS_PER_DAY;
    let w180 = reference_ms - 180 * MS_PER_DAY;

    let ts = || col(INVOICE_DATE).cast(DataType::Int64);
    let in_30d = ts().gt_eq(lit(w30));
    let in_90d = ts().gt_eq(lit(w90));
    let in_prev_90d = ts().gt_eq(lit(w180)).and(ts().lt(lit(w90)));

    let aggregated = group_by_customer(
        df,
        vec![
            col(TOTAL_AMOUNT)
                .filter(in_30d.clone())
                .sum()
                .alias(SPEND_30D),
            col(TOTAL_AMOUNT)
                .filter(in_90d.clone())
                .sum()
                .alias(SPEND_90D),
            col(TOTAL_AMOUNT)
                .filter(in_prev_90d)
                .sum()
                .alias(SPEND_PREV_90D),
            ts().filter(in_30d).count().alias(TRANSACTIONS_30D),
            ts().filter(in_90d).count().alias(TRANSACTIONS_90D),
        ],
    )?;

    let spend_30 = column_f64(&aggregated, SPEND_30D)?;
    let spend_90 = column_f64(&aggregated, SPEND_90D)?;
    let spend_prev_90 = column_f64(&aggregated, SPEND_PREV_90D)?;
    let tx_30 = column_f64(&aggregated, TRANSACTIONS_30D)?;
    let tx_90 = column_f64(&aggregated, TRANSACTIONS_90D)?;

    let ratio_30_90: Vec<f64> = spend_30
        .iter()
        .zip(&spend_90)
        .map(|(a, b)| a / (b + RATIO_EPSILON))
        .collect();
    let ratio_90_180: Vec<f64> = spend_90
        .iter()
        .zip(&spend_prev_90)
        .map(|(a, b)| a / (b + RATIO_EPSILON))
        .collect();
    let freq_30: Vec<f64> = tx_30.iter().map(|c| c / 30.0).collect();
    let freq_90: Vec<f64> = tx_90.iter().map(|c| c / 90.0).collect();

    let mut out = aggregated;
    out.with_column(Series::new(SPEND_RATIO_30D_90D.into(), ratio_30_90))?;
    out.with_column(Series::new(SPEND_RATIO_90D_180D.into(), ratio_90_180))?;
    out.with_column(Series::new(FREQ_30D.into(), freq_30))?;
    out.with_column(Series::new(FREQ_90D.into(), freq_90))?;

    Ok(out.select([
        CUSTOMER_ID,
        SPEND_30D,
        SPEND_90D,
        SPEND_RATIO_30D_90D,
        SPEND_RATIO_90D_180D,
        FREQ_30D,
        FREQ_90D,
        TRANSACTIONS_30D,
        TRANSACTIONS_90D,
    ])?)
}
