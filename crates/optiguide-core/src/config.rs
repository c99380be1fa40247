use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const ORDERS_FILE_NAME: &str = "orders_and_shipments.csv";
pub const INVENTORY_FILE_NAME: &str = "inventory.csv";
pub const FULFILLMENT_FILE_NAME: &str = "fulfillment.csv";
pub const PROCESSED_DIR_NAME: &str = "processed";

/// The three source datasets the preparation step consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Orders,
    Inventory,
    Fulfillment,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [
        TableKind::Orders,
        TableKind::Inventory,
        TableKind::Fulfillment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders",
            TableKind::Inventory => "inventory",
            TableKind::Fulfillment => "fulfillment",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to find the source CSVs and where to write the processed artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepConfig {
    pub data_dir: PathBuf,
    pub orders_path: PathBuf,
    pub inventory_path: PathBuf,
    pub fulfillment_path: PathBuf,
    pub output_dir: PathBuf,
}

impl PrepConfig {
    /// Default layout: the three CSVs directly under `data_dir`, artifacts in
    /// `data_dir/processed`.
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            orders_path: data_dir.join(ORDERS_FILE_NAME),
            inventory_path: data_dir.join(INVENTORY_FILE_NAME),
            fulfillment_path: data_dir.join(FULFILLMENT_FILE_NAME),
            output_dir: data_dir.join(PROCESSED_DIR_NAME),
            data_dir,
        }
    }

    pub fn with_orders_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.orders_path = path.into();
        self
    }

    pub fn with_inventory_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.inventory_path = path.into();
        self
    }

    pub fn with_fulfillment_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fulfillment_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn path_for(&self, table: TableKind) -> &Path {
        match table {
            TableKind::Orders => &self.orders_path,
            TableKind::Inventory => &self.inventory_path,
            TableKind::Fulfillment => &self.fulfillment_path,
        }
    }
}
