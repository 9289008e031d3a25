//! Customer-level train/test partitioning.
//!
//! The split is decided on the unique customer id set, never on rows, so all
//! of a customer's transactions and their label land on the same side. The
//! same [`CustomerSplit`] must be applied to the transaction table and to the
//! label table.

use crate::error::{PipelineError, Result};
use crate::schema::CUSTOMER_ID;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{info, warn};

/// A customer-id-disjoint partition. Both sides are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSplit {
    pub train_ids: Vec<i64>,
    pub test_ids: Vec<i64>,
}

impl CustomerSplit {
    pub fn train_set(&self) -> HashSet<i64> {
        self.train_ids.iter().copied().collect()
    }

    pub fn test_set(&self) -> HashSet<i64> {
        self.test_ids.iter().copied().collect()
    }
}

/// Partitions customers into train and test sets.
pub struct Splitter;

impl Splitter {
    /// Decide a deterministic customer partition.
    ///
    /// Unique customer ids are collected in sorted order, shuffled with a
    /// seeded generator, and the first `ceil(n * test_fraction)` shuffled ids
    /// become the test set. The same seed always produces the same split.
    pub fn split_customers(df: &DataFrame, test_fraction: f64, seed: u64) -> Result<CustomerSplit> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be strictly between 0 and 1, got {test_fraction}"
            )));
        }

        let ids = df.column(CUSTOMER_ID)?.as_materialized_series().i64()?;
        let unique: HashSet<i64> = ids.into_iter().flatten().collect();
        let mut shuffled: Vec<i64> = unique.into_iter().collect();
        shuffled.sort_unstable();

        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let n = shuffled.len();
        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        let mut test_ids: Vec<i64> = shuffled[..n_test].to_vec();
        let mut train_ids: Vec<i64> = shuffled[n_test..].to_vec();
        test_ids.sort_unstable();
        train_ids.sort_unstable();

        if train_ids.is_empty() || test_ids.is_empty() {
            warn!(
                "Degenerate split: {} train / {} test customers",
                train_ids.len(),
                test_ids.len()
            );
        } else {
            info!(
                "Split {} customers into {} train / {} test",
                n,
                train_ids.len(),
                test_ids.len()
            );
        }

        Ok(CustomerSplit {
            train_ids,
            test_ids,
        })
    }

    /// Keep only rows whose customer id belongs to `ids`.
    pub fn filter_by_customers(df: &DataFrame, ids: &[i64]) -> Result<DataFrame> {
        let wanted: HashSet<i64> = ids.iter().copied().collect();
        let column = df.column(CUSTOMER_ID)?.as_materialized_series().i64()?;
        let mask: Vec<bool> = column
            .into_iter()
            .map(|id| id.is_some_and(|id| wanted.contains(&id)))
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        Ok(df.filter(&mask)?)
    }

    /// Apply a split to a customer-keyed table, producing (train, test).
    pub fn partition(df: &DataFrame, split: &CustomerSplit) -> Result<(DataFrame, DataFrame)> {
        let train = Self::filter_by_customers(df, &split.train_ids)?;
        let test = Self::filter_by_customers(df, &split.test_ids)?;
        Ok((train, test))
    }
}
