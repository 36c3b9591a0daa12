//! Daily generation profile: the mean of a generation column per hour of day
//! across one year of the merged dataset.

use crate::schema::error::SchemaError;
use crate::schema::timestamp::TIMESTAMP_COLUMN;
use log::info;
use polars::prelude::*;

/// Generation-value column produced by the ONS dataset.
pub const DEFAULT_ENERGY_COLUMN: &str = "val_geracao";

/// Averages `energy_col` per hour of day over all rows of `year`, sorted by
/// hour. Returns `Ok(None)` when the year has no rows; an empty year is an
/// expected gap, not an error.
pub fn daily_energy_profile(
    df: &DataFrame,
    year: i32,
    energy_col: &str,
) -> Result<Option<DataFrame>, SchemaError> {
    for column in [TIMESTAMP_COLUMN, energy_col] {
        df.column(column)
            .map_err(|_| SchemaError::MissingColumn(column.to_string()))?;
    }

    let timestamp = col(TIMESTAMP_COLUMN).cast(DataType::Datetime(TimeUnit::Milliseconds, None));
    let filtered = df
        .clone()
        .lazy()
        .filter(timestamp.clone().dt().year().eq(lit(year)))
        .collect()?;

    if filtered.height() == 0 {
        info!("No rows for year {}, skipping profile", year);
        return Ok(None);
    }

    let profile = filtered
        .lazy()
        .group_by([timestamp.dt().hour().alias("hora")])
        .agg([col(energy_col).mean().alias("media_geracao")])
        .sort(["hora"], Default::default())
        .collect()?;
    Ok(Some(profile))
}
