use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{PrepConfig, TableKind};
use crate::error::{PrepError, Result};

/// Cell values read as missing, matching the markers pandas treats as NA by
/// default. Empty cells are missing as well.
pub const MISSING_VALUE_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One loaded CSV with its origin, so later stages can name it in errors.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub kind: TableKind,
    pub path: PathBuf,
    pub file_hash: String,
    pub df: DataFrame,
}

impl SourceTable {
    pub fn fingerprint(&self) -> SourceFingerprint {
        SourceFingerprint {
            table: self.kind,
            path: self.path.display().to_string(),
            file_hash: self.file_hash.clone(),
            rows: self.df.height(),
        }
    }
}

/// Provenance of one input file, recorded alongside the artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub table: TableKind,
    pub path: String,
    pub file_hash: String,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct SourceTables {
    pub orders: SourceTable,
    pub inventory: SourceTable,
    pub fulfillment: SourceTable,
}

impl SourceTables {
    pub fn fingerprints(&self) -> Vec<SourceFingerprint> {
        vec![
            self.orders.fingerprint(),
            self.inventory.fingerprint(),
            self.fulfillment.fingerprint(),
        ]
    }
}

/// Loads and normalizes all three tables.
///
/// Every path is checked before any file is read, so a missing file aborts
/// the run without touching the others.
pub fn load_sources(config: &PrepConfig) -> Result<SourceTables> {
    for kind in TableKind::ALL {
        let path = config.path_for(kind);
        if !path.is_file() {
            return Err(PrepError::MissingFile {
                table: kind,
                path: path.to_path_buf(),
            });
        }
    }

    Ok(SourceTables {
        orders: load_table(TableKind::Orders, &config.orders_path)?,
        inventory: load_table(TableKind::Inventory, &config.inventory_path)?,
        fulfillment: load_table(TableKind::Fulfillment, &config.fulfillment_path)?,
    })
}

/// Reads one CSV file (header row, schema inferred over every row, the
/// [`MISSING_VALUE_MARKERS`] loaded as nulls) and trims its column labels.
pub fn load_table(kind: TableKind, path: &Path) -> Result<SourceTable> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PrepError::MissingFile {
                table: kind,
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    let file_hash = blake3::hash(&bytes).to_hex().to_string();

    let null_values = NullValues::AllColumns(
        MISSING_VALUE_MARKERS
            .iter()
            .map(|marker| (*marker).into())
            .collect(),
    );
    let parse_options = CsvParseOptions::default().with_null_values(Some(null_values));

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|source| PrepError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    normalize_column_names(&mut df, kind)?;

    info!(
        table = %kind,
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded source table"
    );

    Ok(SourceTable {
        kind,
        path: path.to_path_buf(),
        file_hash,
        df,
    })
}

/// Strips leading and trailing whitespace from every column label.
pub fn normalize_column_names(df: &mut DataFrame, table: TableKind) -> Result<()> {
    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut seen = HashSet::with_capacity(trimmed.len());
    for name in &trimmed {
        if !seen.insert(name.as_str()) {
            return Err(PrepError::DuplicateColumn {
                table,
                column: name.clone(),
            });
        }
    }

    debug!(table = %table, columns = ?trimmed, "normalized column names");
    df.set_column_names(trimmed.iter().map(|s| s.as_str()))?;
    Ok(())
}
