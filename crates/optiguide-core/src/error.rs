// crates/optiguide-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

use crate::config::TableKind;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("{table} file not found: {}", path.display())]
    MissingFile { table: TableKind, path: PathBuf },

    #[error("{table} table is missing required column '{column}'")]
    Schema { table: TableKind, column: String },

    #[error("{table} table has duplicate column '{column}' after trimming headers")]
    DuplicateColumn { table: TableKind, column: String },

    #[error("{table} column '{column}' has {count} value(s) that are not numeric")]
    NonNumeric {
        table: TableKind,
        column: String,
        count: usize,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("artifact {} is not a supported {expected} file: {reason}", path.display())]
    UnsupportedArtifact {
        path: PathBuf,
        expected: &'static str,
        reason: String,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PrepError>;
