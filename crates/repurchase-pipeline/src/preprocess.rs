//! Raw transaction cleaning.
//!
//! Turns an irregular raw transaction dump into the canonical table every
//! downstream stage reads: parsed timestamps, integer customer ids, positive
//! quantities with a separate return flag, a `total_amount` column, and no
//! rows past the cutoff instant.

use crate::error::{DataFormatError, PipelineError, Result};
use crate::schema::{
    COUNTRY, CUSTOMER_ID, DESCRIPTION, INVOICE_DATE, INVOICE_ID, IS_RETURN, QUANTITY,
    REQUIRED_RAW_COLUMNS, RETURN_INVOICE_PREFIX, STOCK_CODE, TOTAL_AMOUNT, UNIT_PRICE,
};
use crate::utils::{datetime_series, datetime_to_ms, parse_timestamp, timestamp_ms_values};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Cleans raw transaction records into the canonical transaction table.
pub struct Preprocessor;

impl Preprocessor {
    /// Perform basic preprocessing on a raw transaction table.
    ///
    /// The input frame is never mutated. Rows with a missing customer id are
    /// dropped and counted (soft warning); an unparsable timestamp is fatal.
    /// All transactions after `cutoff` are discarded so features computed
    /// later cannot see past the training horizon.
    ///
    /// Invariants on the output: `quantity > 0`, `total_amount >= 0`, no null
    /// `customer_id`, no `invoice_date` after `cutoff`.
    pub fn basic_preprocessing(df: &DataFrame, cutoff: NaiveDateTime) -> Result<DataFrame> {
        ensure_raw_columns(df)?;

        let initial_rows = df.height();
        let cutoff_ms = datetime_to_ms(cutoff);

        let timestamps = parse_invoice_dates(df)?;
        let customer_ids = cast_column_values(df, CUSTOMER_ID)?;
        let quantities = cast_column_values(df, QUANTITY)?;
        let unit_prices = float_column_values(df, UNIT_PRICE)?;
        let invoice_ids = string_column_values(df, INVOICE_ID)?;
        let stock_codes = string_column_values(df, STOCK_CODE)?;
        let descriptions = string_column_values(df, DESCRIPTION)?;
        let countries = string_column_values(df, COUNTRY)?;

        let mut out_invoice: Vec<Option<String>> = Vec::with_capacity(initial_rows);
        let mut out_stock: Vec<Option<String>> = Vec::with_capacity(initial_rows);
        let mut out_description: Vec<Option<String>> = Vec::with_capacity(initial_rows);
        let mut out_quantity: Vec<i64> = Vec::with_capacity(initial_rows);
        let mut out_price: Vec<f64> = Vec::with_capacity(initial_rows);
        let mut out_ts: Vec<Option<i64>> = Vec::with_capacity(initial_rows);
        let mut out_customer: Vec<i64> = Vec::with_capacity(initial_rows);
        let mut out_country: Vec<Option<String>> = Vec::with_capacity(initial_rows);
        let mut out_is_return: Vec<bool> = Vec::with_capacity(initial_rows);
        let mut out_total: Vec<f64> = Vec::with_capacity(initial_rows);

        let mut dropped_missing_customer = 0usize;
        let mut dropped_incomplete = 0usize;
        let mut dropped_zero_quantity = 0usize;

        for row in 0..initial_rows {
            let customer_id = match customer_ids[row] {
                Some(id) => id,
                None => {
                    dropped_missing_customer += 1;
                    continue;
                }
            };
            let (ts, raw_quantity, price) =
                match (timestamps[row], quantities[row], unit_prices[row]) {
                    (Some(ts), Some(q), Some(p)) => (ts, q, p),
                    _ => {
                        dropped_incomplete += 1;
                        continue;
                    }
                };

            let quantity = raw_quantity.abs();
            if quantity == 0 {
                dropped_zero_quantity += 1;
                continue;
            }
            if ts > cutoff_ms {
                continue;
            }

            let invoice = invoice_ids[row].clone();
            let is_return = raw_quantity < 0
                || invoice
                    .as_deref()
                    .is_some_and(|id| id.starts_with(RETURN_INVOICE_PREFIX));

            out_invoice.push(invoice);
            out_stock.push(stock_codes[row].clone());
            out_description.push(descriptions[row].clone());
            out_quantity.push(quantity);
            out_price.push(price);
            out_ts.push(Some(ts));
            out_customer.push(customer_id);
            out_country.push(countries[row].clone());
            out_is_return.push(is_return);
            out_total.push(quantity as f64 * price);
        }

        if dropped_missing_customer > 0 {
            warn!(
                "Dropped {} rows with missing customer_id",
                dropped_missing_customer
            );
        }
        if dropped_incomplete > 0 {
            warn!(
                "Dropped {} rows with missing timestamp, quantity or price",
                dropped_incomplete
            );
        }
        if dropped_zero_quantity > 0 {
            debug!("Dropped {} rows with zero quantity", dropped_zero_quantity);
        }

        let unique_customers: HashSet<i64> = out_customer.iter().copied().collect();
        info!(
            "After preprocessing: {} rows ({} before), {} unique customers",
            out_customer.len(),
            initial_rows,
            unique_customers.len()
        );

        let columns = vec![
            Series::new(INVOICE_ID.into(), out_invoice).into_column(),
            Series::new(STOCK_CODE.into(), out_stock).into_column(),
            Series::new(DESCRIPTION.into(), out_description).into_column(),
            Series::new(QUANTITY.into(), out_quantity).into_column(),
            Series::new(UNIT_PRICE.into(), out_price).into_column(),
            datetime_series(INVOICE_DATE, out_ts)?.into_column(),
            Series::new(CUSTOMER_ID.into(), out_customer).into_column(),
            Series::new(COUNTRY.into(), out_country).into_column(),
            Series::new(IS_RETURN.into(), out_is_return).into_column(),
            Series::new(TOTAL_AMOUNT.into(), out_total).into_column(),
        ];

        Ok(DataFrame::new(columns)?)
    }
}

fn ensure_raw_columns(df: &DataFrame) -> Result<()> {
    let present: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for required in REQUIRED_RAW_COLUMNS {
        if !present.contains(required) {
            return Err(DataFormatError::MissingColumn(required.to_string()).into());
        }
    }
    Ok(())
}

/// Parse the invoice timestamp column into epoch milliseconds.
///
/// Accepts an already-typed Datetime column or a String column matched
/// against [`crate::utils::TIMESTAMP_FORMATS`]; anything else is a format
/// error.
fn parse_invoice_dates(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let series = df.column(INVOICE_DATE)?.as_materialized_series();

    match series.dtype() {
        DataType::String => {
            let values = series.str()?;
            let mut parsed = Vec::with_capacity(values.len());
            for opt_val in values.into_iter() {
                match opt_val {
                    Some(raw) => match parse_timestamp(raw) {
                        Some(dt) => parsed.push(Some(datetime_to_ms(dt))),
                        None => {
                            return Err(DataFormatError::UnparsableTimestamp {
                                column: INVOICE_DATE.to_string(),
                                value: raw.to_string(),
                            }
                            .into());
                        }
                    },
                    None => parsed.push(None),
                }
            }
            Ok(parsed)
        }
        DataType::Datetime(_, _) | DataType::Date => {
            let cast = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| {
                    PipelineError::from(DataFormatError::InvalidColumnType {
                        column: INVOICE_DATE.to_string(),
                        target_type: "Datetime[ms]".to_string(),
                        reason: e.to_string(),
                    })
                })?;
            Ok(timestamp_ms_values(&cast)?)
        }
        other => Err(DataFormatError::InvalidColumnType {
            column: INVOICE_DATE.to_string(),
            target_type: "Datetime[ms]".to_string(),
            reason: format!("unsupported dtype {other}"),
        }
        .into()),
    }
}

/// Coerce an id-like or count-like column to integers, preserving nulls.
fn cast_column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = df.column(name)?.as_materialized_series();
    let cast = series.cast(&DataType::Int64).map_err(|e| {
        PipelineError::from(DataFormatError::InvalidColumnType {
            column: name.to_string(),
            target_type: "Int64".to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(cast.i64()?.into_iter().collect())
}

fn float_column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let cast = series.cast(&DataType::Float64).map_err(|e| {
        PipelineError::from(DataFormatError::InvalidColumnType {
            column: name.to_string(),
            target_type: "Float64".to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(cast.f64()?.into_iter().collect())
}

fn string_column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}
