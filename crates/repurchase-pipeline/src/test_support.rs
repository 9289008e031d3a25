//! Shared fixtures for unit tests.

use crate::config::PipelineConfig;
use crate::schema::{
    COUNTRY, CUSTOMER_ID, DESCRIPTION, INVOICE_DATE, INVOICE_ID, QUANTITY, STOCK_CODE, UNIT_PRICE,
};
use crate::utils::parse_timestamp;
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Default cutoff used across fixtures: 2011-09-01 midnight.
pub fn cutoff() -> NaiveDateTime {
    parse_timestamp("2011-09-01").unwrap()
}

/// A small raw transaction frame exercising the usual dirt: a missing
/// customer id, a negative-quantity return, a zero quantity, and a row past
/// the default cutoff.
pub fn raw_frame() -> DataFrame {
    df![
        INVOICE_ID => ["536365", "536365", "C536379", "536380", "536381", "536382", "536383"],
        STOCK_CODE => ["85123A", "71053", "85123A", "22960", "22961", "22962", "22963"],
        DESCRIPTION => ["WHITE HANGING HEART", "WHITE METAL LANTERN", "WHITE HANGING HEART",
                        "JAM MAKING SET", "JAM JARS", "CERAMIC CAKE STAND", "TEA TIME TRAY"],
        QUANTITY => [6i64, 8, -2, 3, 0, 4, 5],
        UNIT_PRICE => [2.55, 3.39, 2.55, 4.25, 1.85, 9.95, 4.95],
        INVOICE_DATE => ["2011-07-01 08:26:00", "2011-07-15 09:01:00", "2011-08-10 10:03:00",
                         "2011-08-22 11:45:00", "2011-08-23 12:00:00", "2011-08-25 13:17:00",
                         "2011-10-05 14:30:00"],
        CUSTOMER_ID => [Some(17850i64), Some(17850), Some(17850), Some(13047), Some(13047), None, Some(12583)],
        COUNTRY => ["United Kingdom", "United Kingdom", "United Kingdom", "France", "France",
                    "United Kingdom", "Germany"],
    ]
    .unwrap()
}

/// The fixture frame after preprocessing with the default cutoff.
pub fn clean_frame() -> DataFrame {
    crate::preprocess::Preprocessor::basic_preprocessing(&raw_frame(), cutoff()).unwrap()
}

/// Default config matching the fixture horizon.
pub fn config() -> PipelineConfig {
    PipelineConfig::default()
}
