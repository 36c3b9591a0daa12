use crate::dataset::error::DatasetError;
use crate::fetch::error::FetchError;
use crate::geo::GeoError;
use crate::schema::error::SchemaError;
use crate::store::StoreError;
use crate::table::error::TableError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnergimetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not determine a data directory for this platform")]
    DataDirResolution,

    #[error("Data path exists but is not a directory: '{0}'")]
    DataDirConflict(PathBuf),

    #[error("Failed to inspect data directory '{0}'")]
    DataDirInspect(PathBuf, #[source] std::io::Error),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),
}
