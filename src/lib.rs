mod dataset;
mod error;
mod fetch;
mod geo;
mod profile;
mod schema;
mod store;
mod table;
mod utils;

pub use error::EnergimetError;

pub use dataset::builder::{Dataset, DatasetBuilder, DatasetKind, PipelineConfig};
pub use dataset::error::DatasetError;
pub use dataset::report::{BatchId, BatchOutcome, BatchReport};

pub use fetch::archive::extract_zip;
pub use fetch::error::FetchError;
pub use fetch::fetcher::{FetchOutcome, RemoteFetcher};

pub use table::error::TableError;
pub use table::metadata::{MetadataBlock, METADATA_LINES};
pub use table::parser::{parse_plain_delimited, parse_spreadsheet, parse_with_metadata_header};

pub use schema::error::SchemaError;
pub use schema::normalize::{
    filter_and_drop, select_and_rename, GENERATION_DROP_COLUMNS, GENERATION_STATE_COLUMN,
    GENERATION_TYPE_COLUMN, WEATHER_CANONICAL_ORDER, WEATHER_FIELD_NAMES, WEATHER_ORDINALS,
};
pub use schema::timestamp::{reconcile, TIMESTAMP_COLUMN};

pub use geo::{distance_km, GeoError, LatLon};
pub use profile::{daily_energy_profile, DEFAULT_ENERGY_COLUMN};
pub use store::{Store, StoreError};
pub use utils::{ensure_dir_exists, get_data_dir};
