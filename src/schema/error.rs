use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Source table has {found} columns but the ordinal mapping requires at least {required}")]
    SchemaMismatch { required: usize, found: usize },

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Unparseable timestamp '{value}' at row {row}")]
    UnparseableTimestamp { value: String, row: usize },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}
