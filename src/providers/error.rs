use crate::types::provider::Provider;
use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderFetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{provider} fetch for site {site} timed out after {seconds}s")]
    Timeout {
        provider: Provider,
        site: String,
        seconds: u64,
    },

    #[error("{0} has no HTTP transport; use a file extract")]
    Unsupported(Provider),

    #[error("Requested range {start}..={end} for site {site} is inverted")]
    InvalidRange {
        site: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Failed to read provider extract '{0}'")]
    ExtractRead(PathBuf, #[source] std::io::Error),

    // Errors during CSV reading (inside blocking task)
    #[error("I/O error processing {provider} CSV data for site '{site}'")]
    CsvReadIo {
        provider: Provider,
        site: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parsing error processing {provider} CSV data for site '{site}'")]
    CsvReadPolars {
        provider: Provider,
        site: String,
        #[source]
        source: PolarsError,
    },

    #[error("{provider} payload for site {site} has no header line starting with '{marker}'")]
    MissingHeader {
        provider: Provider,
        site: String,
        marker: &'static str,
    },

    #[error("Missing required column '{column}' in {provider} payload for site {site}")]
    MissingColumn {
        provider: Provider,
        site: String,
        column: String,
    },

    #[error("Row {row} of {provider} payload for site {site} has no valid date")]
    InvalidDate {
        provider: Provider,
        site: String,
        row: usize,
    },

    #[error("{provider} payload for site {site} has more than one record for {date}")]
    DuplicateDate {
        provider: Provider,
        site: String,
        date: NaiveDate,
    },

    #[error("Polars operation failed for site {site}: {source}")]
    Polars {
        site: String,
        #[source]
        source: PolarsError,
    },

    // Errors during parquet caching (inside blocking task)
    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),
    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
