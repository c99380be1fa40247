use std::collections::BTreeMap;
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PrepError, Result};
use crate::loader::{SourceTable, SourceTables};
use crate::schema::{
    require_columns, CUSTOMER_MARKET, FULFILLMENT_DAYS, INVENTORY_COST_PER_UNIT, ORDER_QUANTITY,
    PRODUCT_NAME, PROFIT,
};

const OBSERVED: &str = "__observed";

/// Composite key of the historical demand mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DemandKey {
    pub product: String,
    pub market: String,
}

impl DemandKey {
    pub fn new(product: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            market: market.into(),
        }
    }
}

impl fmt::Display for DemandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.product, self.market)
    }
}

/// Parameter lookups fed to the optimization model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterMappings {
    #[serde(rename = "D_PROFIT_PER_PRODUCT")]
    pub profit_per_product: BTreeMap<String, f64>,
    #[serde(rename = "D_INVENTORY_COST")]
    pub inventory_cost: BTreeMap<String, f64>,
    #[serde(rename = "D_FULFILLMENT_TIME")]
    pub fulfillment_time: BTreeMap<String, f64>,
    #[serde(rename = "D_HISTORICAL_DEMAND", with = "demand_entries")]
    pub historical_demand: BTreeMap<DemandKey, f64>,
}

pub fn compute_parameters(tables: &SourceTables) -> Result<ParameterMappings> {
    let profit_per_product = mean_by(&tables.orders, PRODUCT_NAME, PROFIT)?;
    let inventory_cost = mean_by(&tables.inventory, PRODUCT_NAME, INVENTORY_COST_PER_UNIT)?;
    let fulfillment_time = mean_by(&tables.fulfillment, PRODUCT_NAME, FULFILLMENT_DAYS)?;
    let historical_demand =
        sum_by_pair(&tables.orders, PRODUCT_NAME, CUSTOMER_MARKET, ORDER_QUANTITY)?;

    info!(
        profit = profit_per_product.len(),
        inventory_cost = inventory_cost.len(),
        fulfillment_time = fulfillment_time.len(),
        demand = historical_demand.len(),
        "computed parameter mappings"
    );

    Ok(ParameterMappings {
        profit_per_product,
        inventory_cost,
        fulfillment_time,
        historical_demand,
    })
}

/// Mean of `value` per distinct `key`, skipping missing values. A key whose
/// values are all missing has no mean and is left out.
pub fn mean_by(table: &SourceTable, key: &str, value: &str) -> Result<BTreeMap<String, f64>> {
    let grouped = grouped_frame(table, &[key], value)?
        .lazy()
        .group_by([col(key)])
        .agg([
            col(value).mean().alias(value),
            col(value).count().alias(OBSERVED),
        ])
        .collect()?;

    let keys = grouped.column(key)?.str()?;
    let values = grouped.column(value)?.f64()?;
    let observed = grouped.column(OBSERVED)?.cast(&DataType::UInt64)?;
    let observed = observed.u64()?;

    let mut mapping = BTreeMap::new();
    for idx in 0..grouped.height() {
        let Some(group) = keys.get(idx) else {
            continue;
        };
        match (values.get(idx), observed.get(idx)) {
            (Some(mean), Some(count)) if count > 0 => {
                mapping.insert(group.to_string(), mean);
            }
            _ => warn!(
                table = %table.kind,
                column = value,
                key = group,
                "dropping group with no observed values"
            ),
        }
    }

    Ok(mapping)
}

/// Sum of `value` per distinct (`key_a`, `key_b`) pair, skipping missing values.
/// Every pair present in the table gets an entry, `0.0` when all its values
/// are missing.
pub fn sum_by_pair(
    table: &SourceTable,
    key_a: &str,
    key_b: &str,
    value: &str,
) -> Result<BTreeMap<DemandKey, f64>> {
    let grouped = grouped_frame(table, &[key_a, key_b], value)?
        .lazy()
        .group_by([col(key_a), col(key_b)])
        .agg([col(value).sum().alias(value)])
        .collect()?;

    let first = grouped.column(key_a)?.str()?;
    let second = grouped.column(key_b)?.str()?;
    let values = grouped.column(value)?.f64()?;

    let mut mapping = BTreeMap::new();
    for idx in 0..grouped.height() {
        let (Some(product), Some(market)) = (first.get(idx), second.get(idx)) else {
            continue;
        };
        mapping.insert(
            DemandKey::new(product, market),
            values.get(idx).unwrap_or(0.0),
        );
    }

    Ok(mapping)
}

/// Projects `keys` (as non-null strings) and `value` (as Float64) out of the
/// table, ready for grouping.
fn grouped_frame(table: &SourceTable, keys: &[&str], value: &str) -> Result<DataFrame> {
    let mut required = keys.to_vec();
    required.push(value);
    require_columns(&table.df, table.kind, &required)?;

    let mut columns = Vec::with_capacity(keys.len() + 1);
    for key in keys {
        columns.push(table.df.column(key)?.cast(&DataType::String)?);
    }
    columns.push(numeric_column(table, value)?);

    let frame = DataFrame::new(columns)?;
    let not_null = keys
        .iter()
        .map(|key| col(*key).is_not_null())
        .reduce(|acc, expr| acc.and(expr))
        .unwrap_or_else(|| lit(true));

    Ok(frame.lazy().filter(not_null).collect()?)
}

/// Casts `column` to Float64. Cells loaded as missing stay null; any other
/// cell that does not parse as a finite number is an error.
fn numeric_column(table: &SourceTable, column: &str) -> Result<Column> {
    let original = table.df.column(column)?;
    let numeric = original.cast(&DataType::Float64)?;

    let non_finite = numeric
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_finite())
        .count();
    let introduced = numeric.null_count().saturating_sub(original.null_count()) + non_finite;
    if introduced > 0 {
        return Err(PrepError::NonNumeric {
            table: table.kind,
            column: column.to_string(),
            count: introduced,
        });
    }

    Ok(numeric)
}

/// JSON object keys must be strings, so the demand map is stored as a list of
/// `{product, market, value}` records.
mod demand_entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::DemandKey;

    #[derive(Serialize, Deserialize)]
    struct DemandEntry {
        product: String,
        market: String,
        value: f64,
    }

    pub fn serialize<S>(map: &BTreeMap<DemandKey, f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<DemandEntry> = map
            .iter()
            .map(|(key, value)| DemandEntry {
                product: key.product.clone(),
                market: key.market.clone(),
                value: *value,
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<DemandKey, f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<DemandEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (DemandKey::new(entry.product, entry.market), entry.value))
            .collect())
    }
}
