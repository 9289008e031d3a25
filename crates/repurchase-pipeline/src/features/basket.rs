//! Basket diversity features. A basket is one invoice.

use crate::error::Result;
use crate::schema::{CUSTOMER_ID, DESCRIPTION, INVOICE_ID, STOCK_CODE, TOTAL_AMOUNT};
use polars::prelude::*;

pub const UNIQUE_PRODUCTS: &str = "unique_products";
pub const UNIQUE_DESCRIPTIONS: &str = "unique_descriptions";
pub const AVG_BASKET_SIZE: &str = "avg_basket_size";
pub const AVG_BASKET_VALUE: &str = "avg_basket_value";

const BASKET_ITEMS: &str = "basket_items";
const BASKET_AMOUNT: &str = "basket_amount";

pub(super) fn build(df: &DataFrame) -> Result<DataFrame> {
    let diversity = df
        .clone()
        .lazy()
        .group_by([col(CUSTOMER_ID)])
        .agg([
            col(STOCK_CODE).n_unique().alias(UNIQUE_PRODUCTS),
            col(DESCRIPTION).n_unique().alias(UNIQUE_DESCRIPTIONS),
        ]);

    // Two-stage: collapse rows to baskets, then baskets to customers.
    let baskets = df
        .clone()
        .lazy()
        .group_by([col(CUSTOMER_ID), col(INVOICE_ID)])
        .agg([
            col(STOCK_CODE).count().alias(BASKET_ITEMS),
            col(TOTAL_AMOUNT).sum().alias(BASKET_AMOUNT),
        ])
        .group_by([col(CUSTOMER_ID)])
        .agg([
            col(BASKET_ITEMS)
                .cast(DataType::Float64)
                .mean()
                .alias(AVG_BASKET_SIZE),
            col(BASKET_AMOUNT).mean().alias(AVG_BASKET_VALUE),
        ]);

    Ok(diversity
        .join(
            baskets,
            [col(CUSTOMER_ID)],
            [col(CUSTOMER_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([CUSTOMER_ID], SortMultipleOptions::default())
        .collect()?)
}
