//! Temporal habit features: when a customer tends to buy.

use crate::error::Result;
use crate::schema::{CUSTOMER_ID, INVOICE_DATE};
use crate::utils::{ms_to_datetime, timestamp_ms_values, MS_PER_DAY};
use chrono::Datelike;
use polars::prelude::*;
use std::collections::BTreeMap;

pub const AVG_DAY_OF_WEEK: &str = "avg_day_of_week";
pub const STD_DAY_OF_WEEK: &str = "std_day_of_week";
pub const AVG_MONTH: &str = "avg_month";
pub const STD_MONTH: &str = "std_month";
pub const WEEKEND_RATIO: &str = "weekend_ratio";
pub const CUSTOMER_LIFETIME_DAYS: &str = "customer_lifetime_days";

/// Day of week is 0 (Monday) through 6 (Sunday); the weekend is {5, 6}.
/// Standard deviations are sample deviations; a single-transaction customer
/// has no spread and gets 0.
pub(super) fn build(df: &DataFrame) -> Result<DataFrame> {
    let ids = df.column(CUSTOMER_ID)?.as_materialized_series().i64()?;
    let timestamps = timestamp_ms_values(df.column(INVOICE_DATE)?.as_materialized_series())?;

    let mut per_customer: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for (id, ts) in ids.into_iter().zip(timestamps) {
        let (Some(id), Some(ts)) = (id, ts) else {
            continue;
        };
        per_customer.entry(id).or_default().push(ts);
    }

    let n = per_customer.len();
    let mut customers = Vec::with_capacity(n);
    let mut avg_dow = Vec::with_capacity(n);
    let mut std_dow = Vec::with_capacity(n);
    let mut avg_month = Vec::with_capacity(n);
    let mut std_month = Vec::with_capacity(n);
    let mut weekend_ratio = Vec::with_capacity(n);
    let mut lifetime = Vec::with_capacity(n);

    for (id, ts_list) in per_customer {
        let mut days_of_week = Vec::with_capacity(ts_list.len());
        let mut months = Vec::with_capacity(ts_list.len());
        let mut weekend_count = 0usize;
        for &ts in &ts_list {
            let Some(dt) = ms_to_datetime(ts) else {
                continue;
            };
            let dow = dt.weekday().num_days_from_monday() as f64;
            if dow >= 5.0 {
                weekend_count += 1;
            }
            days_of_week.push(dow);
            months.push(dt.month() as f64);
        }
        if days_of_week.is_empty() {
            continue;
        }

        let min_ts = ts_list.iter().min().copied().unwrap_or_default();
        let max_ts = ts_list.iter().max().copied().unwrap_or_default();

        customers.push(id);
        avg_dow.push(mean(&days_of_week));
        std_dow.push(sample_std(&days_of_week));
        avg_month.push(mean(&months));
        std_month.push(sample_std(&months));
        weekend_ratio.push(weekend_count as f64 / days_of_week.len() as f64);
        lifetime.push(((max_ts - min_ts).div_euclid(MS_PER_DAY)) as f64);
    }

    let columns = vec![
        Series::new(CUSTOMER_ID.into(), customers).into_column(),
        Series::new(AVG_DAY_OF_WEEK.into(), avg_dow).into_column(),
        Series::new(STD_DAY_OF_WEEK.into(), std_dow).into_column(),
        Series::new(AVG_MONTH.into(), avg_month).into_column(),
        Series::new(STD_MONTH.into(), std_month).into_column(),
        Series::new(WEEKEND_RATIO.into(), weekend_ratio).into_column(),
        Series::new(CUSTOMER_LIFETIME_DAYS.into(), lifetime).into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two
/// observations.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::clean_frame;

    #[test]
    fn test_single_transaction_std_is_zero() {
        let features = build(&clean_frame()).unwrap();

        // Customer 13047 has a single kept transaction.
        let ids = features.column(CUSTOMER_ID).unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(13047));
        let std = features.column(STD_DAY_OF_WEEK).unwrap().f64().unwrap();
        assert_eq!(std.get(0), Some(0.0));
        let lifetime = features
            .column(CUSTOMER_LIFETIME_DAYS)
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(lifetime.get(0), Some(0.0));
    }

    #[test]
    fn test_lifetime_spans_first_to_last() {
        let features = build(&clean_frame()).unwrap();

        // Customer 17850: 2011-07-01 to 2011-08-10 = 40 days.
        let ids = features.column(CUSTOMER_ID).unwrap().i64().unwrap();
        assert_eq!(ids.get(1), Some(17850));
        let lifetime = features
            .column(CUSTOMER_LIFETIME_DAYS)
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(lifetime.get(1), Some(40.0));
    }

    #[test]
    fn test_weekend_detection() {
        // 2011-08-20 was a Saturday, 2011-08-22 a Monday.
        let df = df![
            CUSTOMER_ID => [1i64, 1],
            INVOICE_DATE => ["2011-08-20 10:00:00", "2011-08-22 10:00:00"],
        ]
        .unwrap();
        let parsed = crate::utils::datetime_series(
            INVOICE_DATE,
            df.column(INVOICE_DATE)
                .unwrap()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.and_then(crate::utils::parse_timestamp).map(crate::utils::datetime_to_ms))
                .collect(),
        )
        .unwrap();
        let mut df = df;
        df.with_column(parsed).unwrap();

        let features = build(&df).unwrap();
        let ratio = features.column(WEEKEND_RATIO).unwrap().f64().unwrap();
        assert!((ratio.get(0).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_sample_std() {
        assert_eq!(sample_std(&[3.0]), 0.0);
        assert!((sample_std(&[1.0, 3.0]) - (2.0f64).sqrt()).abs() < 1e-12);
    }
}
