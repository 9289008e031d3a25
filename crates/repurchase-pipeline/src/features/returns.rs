//! Return behaviour features.

use super::{column_f64, group_by_customer};
use crate::error::Result;
use crate::schema::{CUSTOMER_ID, IS_RETURN, TOTAL_AMOUNT};
use polars::prelude::*;

pub const TOTAL_RETURNS: &str = "total_returns";
pub const RETURN_RATE: &str = "return_rate";
pub const RETURN_AMOUNT: &str = "return_amount";
pub const NET_AMOUNT: &str = "net_amount";

const GROSS_AMOUNT: &str = "gross_amount";

pub(super) fn build(df: &DataFrame) -> Result<DataFrame> {
    let aggregated = group_by_customer(
        df,
        vec![
            col(IS_RETURN)
                .cast(DataType::Int64)
                .sum()
                .alias(TOTAL_RETURNS),
            col(IS_RETURN)
                .cast(DataType::Float64)
                .mean()
                .alias(RETURN_RATE),
            col(TOTAL_AMOUNT).sum().alias(GROSS_AMOUNT),
            col(TOTAL_AMOUNT)
                .filter(col(IS_RETURN))
                .sum()
                .alias(RETURN_AMOUNT),
        ],
    )?;

    let gross = column_f64(&aggregated, GROSS_AMOUNT)?;
    let returned = column_f64(&aggregated, RETURN_AMOUNT)?;
    let net: Vec<f64> = gross.iter().zip(&returned).map(|(g, r)| g - r).collect();

    let mut out = aggregated;
    out.with_column(Series::new(NET_AMOUNT.into(), net))?;

    Ok(out.select([
        CUSTOMER_ID,
        TOTAL_RETURNS,
        RETURN_RATE,
        RETURN_AMOUNT,
        NET_AMOUNT,
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::clean_frame;

    #[test]
    fn test_return_metrics() {
        let features = build(&clean_frame()).unwrap();

        // Customer 17850: 3 rows, one return of 2 * 2.55 = 5.10.
        let ids = features.column(CUSTOMER_ID).unwrap().i64().unwrap();
        assert_eq!(ids.get(1), Some(17850));

        let total = features
            .column(TOTAL_RETURNS)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap();
        assert_eq!(total.i64().unwrap().get(1), Some(1));

        let rate = features.column(RETURN_RATE).unwrap().f64().unwrap();
        assert!((rate.get(1).unwrap() - 1.0 / 3.0).abs() < 1e-9);

        let amount = features.column(RETURN_AMOUNT).unwrap().f64().unwrap();
        assert!((amount.get(1).unwrap() - 5.10).abs() < 1e-9);
    }

    #[test]
    fn test_no_returns_is_zero() {
        let features = build(&clean_frame()).unwrap();

        // Customer 13047 never returned anything.
        let ids = features.column(CUSTOMER_ID).unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(13047));

        let amount = features.column(RETURN_AMOUNT).unwrap().f64().unwrap();
        assert_eq!(amount.get(0), Some(0.0));

        let net = features.column(NET_AMOUNT).unwrap().f64().unwrap();
        assert!((net.get(0).unwrap() - 12.75).abs() < 1e-9);
    }
}
