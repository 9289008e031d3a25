//! Shared helpers for timestamp handling and Series transformations.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Milliseconds in one day; the pipeline stores timestamps as Datetime[ms].
pub const MS_PER_DAY: i64 = 86_400_000;

/// Timestamp formats accepted for raw invoice dates, tried in order.
pub const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a raw timestamp string, falling back to a bare date at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a naive timestamp to epoch milliseconds.
pub fn datetime_to_ms(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Convert epoch milliseconds back to a naive timestamp.
pub fn ms_to_datetime(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Extract a column's underlying timestamps (or any castable values) as
/// epoch-millisecond integers, preserving nulls.
pub fn timestamp_ms_values(series: &Series) -> PolarsResult<Vec<Option<i64>>> {
    let cast = series.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

/// Build a Datetime[ms] Series from epoch-millisecond values.
pub fn datetime_series(name: &str, values: Vec<Option<i64>>) -> PolarsResult<Series> {
    Series::new(name.into(), values).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64, which is also the canonical dtype for
/// feature columns.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let filled = cast
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect::<Vec<_>>();
    Ok(Series::new(series.name().clone(), filled))
}
