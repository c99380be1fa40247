use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::loader::SourceTable;
use crate::schema::{
    require_columns, CUSTOMER_MARKET, PRODUCT_NAME, SHIPMENT_MODE, WAREHOUSE_COUNTRY,
};

/// Index sets of the optimization model, drawn from the orders table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationSets {
    #[serde(rename = "P_PRODUCTS")]
    pub products: BTreeSet<String>,
    #[serde(rename = "W_WAREHOUSES")]
    pub warehouses: BTreeSet<String>,
    #[serde(rename = "M_MARKETS")]
    pub markets: BTreeSet<String>,
    #[serde(rename = "T_SHIP_MODES")]
    pub ship_modes: BTreeSet<String>,
}

pub fn extract_sets(orders: &SourceTable) -> Result<OptimizationSets> {
    let sets = OptimizationSets {
        products: distinct_values(orders, PRODUCT_NAME)?,
        warehouses: distinct_values(orders, WAREHOUSE_COUNTRY)?,
        markets: distinct_values(orders, CUSTOMER_MARKET)?,
        ship_modes: distinct_values(orders, SHIPMENT_MODE)?,
    };

    info!(
        products = sets.products.len(),
        warehouses = sets.warehouses.len(),
        markets = sets.markets.len(),
        ship_modes = sets.ship_modes.len(),
        "extracted optimization sets"
    );

    Ok(sets)
}

/// Distinct non-null values of `column`, rendered as strings.
pub fn distinct_values(table: &SourceTable, column: &str) -> Result<BTreeSet<String>> {
    require_columns(&table.df, table.kind, &[column])?;

    let as_text = table.df.column(column)?.cast(&DataType::String)?;
    let values = as_text
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    Ok(values)
}
