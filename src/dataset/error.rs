use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Invalid year range: start {start} is after end {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("No batch in {start}..={end} produced any rows")]
    EmptyDataset { start: i32, end: i32 },

    #[error("Failed to create destination directory '{0}'")]
    DestDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to concatenate batches: {0}")]
    Concat(#[from] PolarsError),
}
