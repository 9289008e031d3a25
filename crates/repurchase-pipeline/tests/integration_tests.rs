//! Integration tests for the repeat-purchase feature pipeline.
//!
//! These tests verify end-to-end behavior across preprocessing, labeling,
//! splitting, and feature engineering on small synthetic transaction sets.

use polars::prelude::*;
use repurchase_pipeline::features::{FeatureSchema, RECENCY_DAYS};
use repurchase_pipeline::schema::{
    COUNTRY, CUSTOMER_ID, DESCRIPTION, INVOICE_DATE, INVOICE_ID, QUANTITY, STOCK_CODE,
    TOTAL_AMOUNT, UNIT_PRICE, WILL_PURCHASE,
};
use repurchase_pipeline::{
    FeatureEngineer, Labeler, Pipeline, PipelineConfig, Preprocessor, Splitter,
};

// ============================================================================
// Helper Functions
// ============================================================================

struct Tx {
    invoice: &'static str,
    stock: &'static str,
    quantity: i64,
    price: f64,
    date: &'static str,
    customer: i64,
    country: &'static str,
}

fn raw_frame(transactions: &[Tx]) -> DataFrame {
    df![
        INVOICE_ID => transactions.iter().map(|t| t.invoice).collect::<Vec<_>>(),
        STOCK_CODE => transactions.iter().map(|t| t.stock).collect::<Vec<_>>(),
        DESCRIPTION => transactions.iter().map(|t| t.stock).collect::<Vec<_>>(),
        QUANTITY => transactions.iter().map(|t| t.quantity).collect::<Vec<_>>(),
        UNIT_PRICE => transactions.iter().map(|t| t.price).collect::<Vec<_>>(),
        INVOICE_DATE => transactions.iter().map(|t| t.date).collect::<Vec<_>>(),
        CUSTOMER_ID => transactions.iter().map(|t| t.customer).collect::<Vec<_>>(),
        COUNTRY => transactions.iter().map(|t| t.country).collect::<Vec<_>>(),
    ]
    .unwrap()
}

fn tx(invoice: &'static str, date: &'static str, customer: i64) -> Tx {
    Tx {
        invoice,
        stock: "P100",
        quantity: 2,
        price: 5.0,
        date,
        customer,
        country: "United Kingdom",
    }
}

fn preprocess(transactions: &[Tx], cutoff: &str) -> DataFrame {
    let config = PipelineConfig::builder()
        .cutoff_date(cutoff)
        .build()
        .unwrap();
    Preprocessor::basic_preprocessing(&raw_frame(transactions), config.cutoff_date).unwrap()
}

// ============================================================================
// Preprocessing
// ============================================================================

#[test]
fn test_preprocessing_invariants_hold() {
    let transactions = [
        tx("I1", "2011-01-05 10:00:00", 1),
        Tx {
            quantity: -3,
            ..tx("C2", "2011-02-01 09:00:00", 1)
        },
        tx("I3", "2011-03-01 16:30:00", 2),
    ];
    let clean = preprocess(&transactions, "2011-09-01");

    let quantity = clean.column(QUANTITY).unwrap().i64().unwrap();
    assert!(quantity.into_no_null_iter().all(|q| q > 0));

    let total = clean.column(TOTAL_AMOUNT).unwrap().f64().unwrap();
    assert!(total.into_no_null_iter().all(|t| t >= 0.0));

    assert_eq!(clean.column(CUSTOMER_ID).unwrap().null_count(), 0);
}

// ============================================================================
// Labeling
// ============================================================================

#[test]
fn test_label_window_example() {
    // Transactions at days 1, 15, 20, and 45 of January. With max = day 45
    // and a 30-day window the prediction cutoff is day 15: customer 1 (day 1
    // only) gets 0, customer 2 (day 20) gets 1.
    let transactions = [
        tx("I1", "2011-01-01 12:00:00", 1),
        tx("I2", "2011-01-15 12:00:00", 1),
        tx("I3", "2011-01-20 12:00:00", 2),
        tx("I4", "2011-02-14 12:00:00", 3),
    ];
    let clean = preprocess(&transactions, "2011-09-01");
    let labels = Labeler::create_labels(&clean, 30).unwrap();

    let will = labels.column(WILL_PURCHASE).unwrap().i32().unwrap();
    // Sorted by customer id: 1, 2, 3.
    assert_eq!(will.get(0), Some(0));
    assert_eq!(will.get(1), Some(1));
    assert_eq!(will.get(2), Some(1));
}

// ============================================================================
// Splitting
// ============================================================================

#[test]
fn test_split_partition_and_determinism() {
    let transactions: Vec<Tx> = (1..=30)
        .map(|c| tx("I1", "2011-05-01 10:00:00", c))
        .collect();
    let clean = preprocess(&transactions, "2011-09-01");

    let first = Splitter::split_customers(&clean, 0.2, 42).unwrap();
    let second = Splitter::split_customers(&clean, 0.2, 42).unwrap();
    assert_eq!(first, second);

    let train = first.train_set();
    let test = first.test_set();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.len() + test.len(), 30);
    assert_eq!(test.len(), 6);
}

// ============================================================================
// Feature Engineering
// ============================================================================

#[test]
fn test_create_all_features_is_idempotent() {
    let transactions = [
        tx("I1", "2011-06-01 10:00:00", 1),
        tx("I2", "2011-07-01 10:00:00", 1),
        tx("I3", "2011-08-01 10:00:00", 2),
    ];
    let clean = preprocess(&transactions, "2011-09-01");
    let config = PipelineConfig::default();
    let engineer = FeatureEngineer::new(config.reference_date);

    let first = engineer.create_all_features(&clean, None).unwrap();
    let second = engineer.create_all_features(&clean, None).unwrap();
    assert!(first.equals_missing(&second));
}

#[test]
fn test_reference_alignment_swaps_country_columns() {
    let transactions = [
        tx("I1", "2011-06-01 10:00:00", 1),
        Tx {
            country: "France",
            ..tx("I2", "2011-07-01 10:00:00", 2)
        },
    ];
    let clean = preprocess(&transactions, "2011-09-01");
    let config = PipelineConfig::default();
    let engineer = FeatureEngineer::new(config.reference_date);

    let unaligned = engineer.create_all_features(&clean, None).unwrap();
    assert!(unaligned.column("country_France").is_ok());

    // Pretend training only ever saw Germany.
    let reference_columns: Vec<String> = unaligned
        .get_column_names()
        .into_iter()
        .filter(|c| !c.starts_with("country_"))
        .map(|s| s.to_string())
        .chain(std::iter::once("country_Germany".to_string()))
        .collect();
    let reference = FeatureSchema::from_columns(reference_columns.clone());

    let aligned = engineer
        .create_all_features(&clean, Some(&reference))
        .unwrap();

    let names: Vec<String> = aligned
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, reference_columns);

    let germany = aligned.column("country_Germany").unwrap().f64().unwrap();
    assert!(germany.into_no_null_iter().all(|v| v == 0.0));
    assert!(aligned.column("country_France").is_err());
    assert!(aligned.column("country_United Kingdom").is_err());
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn test_end_to_end_three_customers() {
    // Five transactions over three customers, one country; the reference
    // date (2011-09-01) is after every transaction. Customer 3's last
    // purchase is exactly ten days before the reference.
    let transactions = [
        tx("I1", "2011-07-01 00:00:00", 1),
        tx("I2", "2011-07-15 00:00:00", 1),
        tx("I3", "2011-08-01 00:00:00", 2),
        tx("I4", "2011-08-10 00:00:00", 3),
        tx("I5", "2011-08-22 00:00:00", 3),
    ];
    let clean = preprocess(&transactions, "2011-09-01");
    let config = PipelineConfig::default();
    let engineer = FeatureEngineer::new(config.reference_date);
    let features = engineer.create_all_features(&clean, None).unwrap();

    assert_eq!(features.height(), 3);

    let ids = features.column(CUSTOMER_ID).unwrap().i64().unwrap();
    assert_eq!(ids.get(2), Some(3));
    let recency = features.column(RECENCY_DAYS).unwrap().f64().unwrap();
    assert_eq!(recency.get(2), Some(10.0));
}

#[test]
fn test_pipeline_run_produces_aligned_outputs() {
    let transactions: Vec<Tx> = (1..=20)
        .flat_map(|c| {
            [
                tx("I1", "2011-05-01 10:00:00", c),
                tx("I2", "2011-08-25 10:00:00", c),
            ]
        })
        .collect();

    let config = PipelineConfig::builder()
        .cutoff_date("2011-09-01")
        .test_fraction(0.25)
        .seed(42)
        .build()
        .unwrap();
    let output = Pipeline::new(config)
        .unwrap()
        .run(&raw_frame(&transactions))
        .unwrap();

    assert_eq!(output.train_features.height(), 15);
    assert_eq!(output.test_features.height(), 5);

    let train_columns: Vec<String> = output
        .train_features
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let test_columns: Vec<String> = output
        .test_features
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(train_columns, test_columns);

    assert_eq!(output.train_labels.height(), 15);
    assert_eq!(output.test_labels.height(), 5);
}
