use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Malformed metadata block in '{path}' at line {line}: expected exactly one ';' separator")]
    MalformedMetadata { path: PathBuf, line: usize },

    #[error("Metadata block in '{path}' has {found} lines, expected {expected}")]
    TruncatedMetadata {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("I/O error parsing CSV file '{0}'")]
    CsvReadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV file '{0}'")]
    CsvReadPolars(PathBuf, #[source] PolarsError),

    #[error("Failed to open spreadsheet '{0}'")]
    SpreadsheetOpen(PathBuf, #[source] calamine::Error),

    #[error("Spreadsheet '{0}' has no data")]
    EmptySpreadsheet(PathBuf),

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
