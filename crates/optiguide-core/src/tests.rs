use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use polars::prelude::*;
use tempfile::tempdir;

use crate::aggregate::{compute_parameters, mean_by, sum_by_pair, DemandKey};
use crate::config::{PrepConfig, TableKind};
use crate::error::PrepError;
use crate::loader::{load_sources, load_table, normalize_column_names, SourceTable};
use crate::schema::{CUSTOMER_MARKET, ORDER_QUANTITY, PRODUCT_NAME, PROFIT, SHIPMENT_MODE};
use crate::sets::{distinct_values, extract_sets};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn fixture_config() -> PrepConfig {
    PrepConfig::from_data_dir(fixture_dir())
}

fn table(kind: TableKind, df: DataFrame) -> SourceTable {
    SourceTable {
        kind,
        path: PathBuf::from(format!("{kind}.csv")),
        file_hash: String::new(),
        df,
    }
}

fn string_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn loads_fixtures_with_trimmed_headers() {
    let tables = load_sources(&fixture_config()).expect("fixture load failed");

    let names: Vec<String> = tables
        .orders
        .df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(
        names,
        [
            "Order ID",
            "Product Name",
            "Warehouse Country",
            "Customer Market",
            "Shipment Mode",
            "Profit",
            "Order Quantity",
        ]
    );
    assert!(tables
        .inventory
        .df
        .column("Inventory Cost Per Unit")
        .is_ok());
    assert!(tables
        .fulfillment
        .df
        .column("Warehouse Order Fulfillment (days)")
        .is_ok());
    assert_eq!(tables.orders.df.height(), 6);
    assert_eq!(tables.orders.file_hash.len(), 64);
}

#[test]
fn normalize_rejects_headers_that_collide_after_trimming() {
    let mut df = DataFrame::new(vec![
        Series::new("Profit".into(), [1.0f64]).into(),
        Series::new(" Profit ".into(), [2.0f64]).into(),
    ])
    .unwrap();

    let err = normalize_column_names(&mut df, TableKind::Orders).unwrap_err();
    assert!(matches!(
        err,
        PrepError::DuplicateColumn { table: TableKind::Orders, ref column } if column == "Profit"
    ));
}

#[test]
fn extracts_distinct_sets_from_orders() {
    let tables = load_sources(&fixture_config()).unwrap();
    let sets = extract_sets(&tables.orders).unwrap();

    assert_eq!(sets.products, string_set(&["Gadget", "Widget"]));
    assert_eq!(sets.warehouses, string_set(&["Puerto Rico", "USA"]));
    assert_eq!(sets.markets, string_set(&["APAC", "Europe", "LATAM"]));
    assert_eq!(sets.ship_modes, string_set(&["Air", "Sea"]));
}

#[test]
fn distinct_values_skip_nulls() {
    let df = DataFrame::new(vec![Series::new(
        SHIPMENT_MODE.into(),
        [Some("Sea"), None, Some("Air"), Some("Sea")],
    )
    .into()])
    .unwrap();

    let values = distinct_values(&table(TableKind::Orders, df), SHIPMENT_MODE).unwrap();
    assert_eq!(values, string_set(&["Air", "Sea"]));
}

#[test]
fn missing_set_column_is_a_schema_error() {
    let df = DataFrame::new(vec![Series::new(PRODUCT_NAME.into(), ["A"]).into()]).unwrap();

    let err = distinct_values(&table(TableKind::Orders, df), SHIPMENT_MODE).unwrap_err();
    match err {
        PrepError::Schema { table, column } => {
            assert_eq!(table, TableKind::Orders);
            assert_eq!(column, SHIPMENT_MODE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fixture_parameters_match_hand_computed_values() {
    let tables = load_sources(&fixture_config()).unwrap();
    let params = compute_parameters(&tables).unwrap();

    assert_eq!(params.profit_per_product["Widget"], 20.0);
    assert_eq!(params.profit_per_product["Gadget"], -4.5);

    assert_eq!(params.inventory_cost["Widget"], 3.0);
    assert_eq!(params.inventory_cost["Gadget"], 1.25);

    assert_eq!(params.fulfillment_time.len(), 2);
    assert_eq!(params.fulfillment_time["Widget"], 5.0);
    assert_eq!(params.fulfillment_time["Gadget"], 8.5);
    assert!(!params.fulfillment_time.contains_key("Gizmo"));

    assert_eq!(params.historical_demand.len(), 5);
    assert_eq!(params.historical_demand[&DemandKey::new("Widget", "Europe")], 8.0);
    assert_eq!(params.historical_demand[&DemandKey::new("Widget", "LATAM")], 4.0);
    assert_eq!(params.historical_demand[&DemandKey::new("Gadget", "LATAM")], 2.0);
    assert_eq!(params.historical_demand[&DemandKey::new("Gadget", "Europe")], 1.0);
    assert_eq!(params.historical_demand[&DemandKey::new("Gadget", "APAC")], 0.0);
}

#[test]
fn two_row_example_yields_mean_profit_and_summed_demand() {
    let df = DataFrame::new(vec![
        Series::new(PRODUCT_NAME.into(), ["ProductA", "ProductA"]).into(),
        Series::new(CUSTOMER_MARKET.into(), ["MarketX", "MarketX"]).into(),
        Series::new(PROFIT.into(), [10i64, 20]).into(),
        Series::new(ORDER_QUANTITY.into(), [3i64, 4]).into(),
    ])
    .unwrap();
    let orders = table(TableKind::Orders, df);

    let profit = mean_by(&orders, PRODUCT_NAME, PROFIT).unwrap();
    assert_eq!(profit.len(), 1);
    assert_eq!(profit["ProductA"], 15.0);

    let demand = sum_by_pair(&orders, PRODUCT_NAME, CUSTOMER_MARKET, ORDER_QUANTITY).unwrap();
    assert_eq!(demand.len(), 1);
    assert_eq!(demand[&DemandKey::new("ProductA", "MarketX")], 7.0);
}

#[test]
fn rows_with_null_keys_are_excluded() {
    let df = DataFrame::new(vec![
        Series::new(PRODUCT_NAME.into(), [Some("A"), None, Some("A")]).into(),
        Series::new(PROFIT.into(), [Some(1.0f64), Some(100.0), Some(3.0)]).into(),
    ])
    .unwrap();

    let profit = mean_by(&table(TableKind::Orders, df), PRODUCT_NAME, PROFIT).unwrap();
    assert_eq!(profit.len(), 1);
    assert_eq!(profit["A"], 2.0);
}

#[test]
fn non_numeric_values_are_rejected() {
    let df = DataFrame::new(vec![
        Series::new(PRODUCT_NAME.into(), ["A", "A", "B"]).into(),
        Series::new(PROFIT.into(), [Some("10"), Some("abc"), None]).into(),
    ])
    .unwrap();

    let err = mean_by(&table(TableKind::Orders, df), PRODUCT_NAME, PROFIT).unwrap_err();
    match err {
        PrepError::NonNumeric {
            table,
            column,
            count,
        } => {
            assert_eq!(table, TableKind::Orders);
            assert_eq!(column, PROFIT);
            assert_eq!(count, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_value_column_is_a_schema_error() {
    let df = DataFrame::new(vec![Series::new(PRODUCT_NAME.into(), ["A"]).into()]).unwrap();

    let err = mean_by(
        &table(TableKind::Inventory, df),
        PRODUCT_NAME,
        "Inventory Cost Per Unit",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PrepError::Schema { table: TableKind::Inventory, ref column }
            if column == "Inventory Cost Per Unit"
    ));
}

#[test]
fn load_table_reports_missing_path() {
    let path = fixture_dir().join("does_not_exist.csv");
    let err = load_table(TableKind::Fulfillment, &path).unwrap_err();
    match err {
        PrepError::MissingFile { table, path: reported } => {
            assert_eq!(table, TableKind::Fulfillment);
            assert_eq!(reported, path);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_value_markers_are_skipped_by_mean() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(
        &path,
        "Product Name,Profit\nA,10\nA,NA\nA,N/A\nA,NaN\nA,30\nB,null\nB,#N/A\n",
    )
    .unwrap();

    let orders = load_table(TableKind::Orders, &path).unwrap();
    let profit = mean_by(&orders, PRODUCT_NAME, PROFIT).unwrap();

    assert_eq!(profit.len(), 1);
    assert_eq!(profit["A"], 20.0);
    assert!(!profit.contains_key("B"));
}

#[test]
fn garbage_cells_in_loaded_csv_are_still_non_numeric() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(&path, "Product Name,Profit\nA,10\nA,NA\nA,abc\n").unwrap();

    let orders = load_table(TableKind::Orders, &path).unwrap();
    let err = mean_by(&orders, PRODUCT_NAME, PROFIT).unwrap_err();
    assert!(matches!(err, PrepError::NonNumeric { count: 1, .. }));
}

#[test]
fn demand_pairs_with_only_missing_quantities_sum_to_zero() {
    let df = DataFrame::new(vec![
        Series::new(PRODUCT_NAME.into(), ["A", "A", "A"]).into(),
        Series::new(CUSTOMER_MARKET.into(), ["X", "Y", "Y"]).into(),
        Series::new(ORDER_QUANTITY.into(), [Some(2i64), None, None]).into(),
    ])
    .unwrap();

    let demand =
        sum_by_pair(&table(TableKind::Orders, df), PRODUCT_NAME, CUSTOMER_MARKET, ORDER_QUANTITY)
            .unwrap();
    assert_eq!(demand.len(), 2);
    assert_eq!(demand[&DemandKey::new("A", "X")], 2.0);
    assert_eq!(demand[&DemandKey::new("A", "Y")], 0.0);
}
