use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create output file '{0}'")]
    Create(PathBuf, #[source] std::io::Error),

    #[error("Failed to build table for '{0}'")]
    Frame(PathBuf, #[source] PolarsError),

    #[error("Failed to write table '{0}'")]
    Write(PathBuf, #[source] PolarsError),

    #[error("Failed to read table '{0}'")]
    Read(PathBuf, #[source] PolarsError),

    #[error("Table '{path}' is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Table '{path}', row {row}: cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to write manifest '{0}'")]
    Manifest(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode manifest")]
    ManifestEncode(#[from] serde_json::Error),
}
