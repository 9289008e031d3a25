//! Canonical column names for the transaction, label, and feature tables.
//!
//! Every stage addresses columns through these constants so the raw-input
//! contract lives in one place.

/// Invoice identifier. A leading [`RETURN_INVOICE_PREFIX`] marks a return.
pub const INVOICE_ID: &str = "invoice_id";
/// Product code.
pub const STOCK_CODE: &str = "stock_code";
/// Product description.
pub const DESCRIPTION: &str = "description";
/// Item quantity. Signed in raw data; positive after preprocessing.
pub const QUANTITY: &str = "quantity";
/// Unit price, non-negative decimal.
pub const UNIT_PRICE: &str = "unit_price";
/// Invoice timestamp.
pub const INVOICE_DATE: &str = "invoice_date";
/// Customer identifier. Rows without one are dropped during preprocessing.
pub const CUSTOMER_ID: &str = "customer_id";
/// Country the transaction was placed from.
pub const COUNTRY: &str = "country";

/// Derived: row came from a return (negative raw quantity or `C`-invoice).
pub const IS_RETURN: &str = "is_return";
/// Derived: `|quantity| * unit_price`.
pub const TOTAL_AMOUNT: &str = "total_amount";

/// Label table: latest purchase timestamp per customer.
pub const LAST_PURCHASE_DATE: &str = "last_purchase_date";
/// Label table: 1 if the customer purchased inside the prediction window.
pub const WILL_PURCHASE: &str = "will_purchase";

/// Invoice ids beginning with this prefix denote cancelled/returned orders.
pub const RETURN_INVOICE_PREFIX: &str = "C";

/// Prefix for the one-hot geographic feature columns.
pub const COUNTRY_FEATURE_PREFIX: &str = "country_";

/// The eight raw columns every transaction source must provide.
pub const REQUIRED_RAW_COLUMNS: [&str; 8] = [
    INVOICE_ID,
    STOCK_CODE,
    DESCRIPTION,
    QUANTITY,
    UNIT_PRICE,
    INVOICE_DATE,
    CUSTOMER_ID,
    COUNTRY,
];

/// Header spellings used by the Online Retail CSV export, mapped to the
/// canonical names above. Applied by the CLI loader when present.
pub const RAW_HEADER_ALIASES: [(&str, &str); 8] = [
    ("InvoiceNo", INVOICE_ID),
    ("StockCode", STOCK_CODE),
    ("Description", DESCRIPTION),
    ("Quantity", QUANTITY),
    ("UnitPrice", UNIT_PRICE),
    ("InvoiceDate", INVOICE_DATE),
    ("CustomerID", CUSTOMER_ID),
    ("Country", COUNTRY),
];
