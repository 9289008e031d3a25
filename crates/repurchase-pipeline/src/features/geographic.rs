//! Geographic features: one-hot encoding of each customer's primary country.

use crate::error::Result;
use crate::schema::{COUNTRY, COUNTRY_FEATURE_PREFIX, CUSTOMER_ID};
use polars::prelude::*;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The primary country is the customer's most frequent one; a tie goes to
/// the country seen first in row order.
pub(super) fn build(df: &DataFrame) -> Result<DataFrame> {
    let ids = df.column(CUSTOMER_ID)?.as_materialized_series().i64()?;
    let countries = df.column(COUNTRY)?.as_materialized_series();
    let countries = countries.cast(&DataType::String)?;
    let countries = countries.str()?;

    // customer -> country -> (count, first row index)
    let mut counts: BTreeMap<i64, HashMap<String, (usize, usize)>> = BTreeMap::new();
    for (row, (id, country)) in ids.into_iter().zip(countries.into_iter()).enumerate() {
        let (Some(id), Some(country)) = (id, country) else {
            continue;
        };
        let entry = counts
            .entry(id)
            .or_default()
            .entry(country.to_string())
            .or_insert((0, row));
        entry.0 += 1;
    }

    let mut customers: Vec<i64> = Vec::with_capacity(counts.len());
    let mut primary: Vec<Option<String>> = Vec::with_capacity(counts.len());
    let mut observed: BTreeSet<String> = BTreeSet::new();
    for (id, by_country) in &counts {
        let winner = by_country
            .iter()
            .max_by_key(|(_, (count, first_row))| (*count, Reverse(*first_row)))
            .map(|(country, _)| country.clone());
        if let Some(country) = &winner {
            observed.insert(country.clone());
        }
        customers.push(*id);
        primary.push(winner);
    }

    let mut columns = vec![Series::new(CUSTOMER_ID.into(), customers).into_column()];
    for country in &observed {
        let indicator: Vec<f64> = primary
            .iter()
            .map(|p| match p {
                Some(p) if p == country => 1.0,
                _ => 0.0,
            })
            .collect();
        let name = format!("{COUNTRY_FEATURE_PREFIX}{country}");
        columns.push(Series::new(name.into(), indicator).into_column());
    }

    Ok(DataFrame::new(columns)?)
}
