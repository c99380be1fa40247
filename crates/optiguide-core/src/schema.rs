use polars::prelude::DataFrame;

use crate::config::TableKind;
use crate::error::{PrepError, Result};

pub const PRODUCT_NAME: &str = "Product Name";
pub const WAREHOUSE_COUNTRY: &str = "Warehouse Country";
pub const CUSTOMER_MARKET: &str = "Customer Market";
pub const SHIPMENT_MODE: &str = "Shipment Mode";
pub const PROFIT: &str = "Profit";
pub const ORDER_QUANTITY: &str = "Order Quantity";
pub const INVENTORY_COST_PER_UNIT: &str = "Inventory Cost Per Unit";
pub const FULFILLMENT_DAYS: &str = "Warehouse Order Fulfillment (days)";

pub const ORDERS_COLUMNS: &[&str] = &[
    PRODUCT_NAME,
    WAREHOUSE_COUNTRY,
    CUSTOMER_MARKET,
    SHIPMENT_MODE,
    PROFIT,
    ORDER_QUANTITY,
];
pub const INVENTORY_COLUMNS: &[&str] = &[PRODUCT_NAME, INVENTORY_COST_PER_UNIT];
pub const FULFILLMENT_COLUMNS: &[&str] = &[PRODUCT_NAME, FULFILLMENT_DAYS];

pub fn required_columns(table: TableKind) -> &'static [&'static str] {
    match table {
        TableKind::Orders => ORDERS_COLUMNS,
        TableKind::Inventory => INVENTORY_COLUMNS,
        TableKind::Fulfillment => FULFILLMENT_COLUMNS,
    }
}

/// Fails with [`PrepError::Schema`] naming the first column in `columns` that
/// `df` does not have.
pub fn require_columns(df: &DataFrame, table: TableKind, columns: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for column in columns {
        if !present.iter().any(|name| name.as_str() == *column) {
            return Err(PrepError::Schema {
                table,
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}
