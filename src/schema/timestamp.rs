//! Reconciliation of the separate date and time fields into one timestamp.
//!
//! The raw files disagree on time formats: `HHMM` without a separator versus
//! `HH:MM`, with or without a trailing `" UTC"` marker, and dates with either
//! `-` or `/` separators. Everything is normalized to `YYYY/MM/DD HH:MM`
//! before parsing.

use crate::schema::error::SchemaError;
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;

/// Name of the merged timestamp column on reconciled tables.
pub const TIMESTAMP_COLUMN: &str = "data_hora_completa";

const DATE_COLUMN: &str = "data_completa";
const TIME_COLUMN: &str = "hora";
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M";
const ZONE_SUFFIX: &str = " UTC";

/// Merges `data_completa` and `hora` into a single validated
/// [`TIMESTAMP_COLUMN`] (Datetime, milliseconds), dropping the two source
/// columns. Rows whose year falls outside the closed `keep_years` range are
/// silently dropped; a value that does not parse at all is a hard row-level
/// failure, never a silent coercion.
pub fn reconcile(df: &DataFrame, keep_years: (i32, i32)) -> Result<DataFrame, SchemaError> {
    let dates = column_str(df, DATE_COLUMN)?;
    let times = column_str(df, TIME_COLUMN)?;

    let mut stamps: Vec<i64> = Vec::with_capacity(df.height());
    let mut keep: Vec<bool> = Vec::with_capacity(df.height());
    let (first_year, last_year) = keep_years;

    for (row, (date, time)) in dates.into_iter().zip(times).enumerate() {
        let combined = match (date, time) {
            (Some(date), Some(time)) => combine(date, time),
            _ => String::new(),
        };
        let parsed = NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT).map_err(|_| {
            SchemaError::UnparseableTimestamp {
                value: combined.clone(),
                row,
            }
        })?;
        stamps.push(parsed.and_utc().timestamp_millis());
        let year = parsed.year();
        keep.push(year >= first_year && year <= last_year);
    }

    let timestamps = Series::new(TIMESTAMP_COLUMN.into(), stamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let mut out = df.drop(DATE_COLUMN)?.drop(TIME_COLUMN)?;
    out.with_column(timestamps)?;

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(out.filter(&mask)?)
}

fn combine(date: &str, time: &str) -> String {
    let time = time.strip_suffix(ZONE_SUFFIX).unwrap_or(time);
    // Fixed-width HHMM without a separator.
    let time = if time.len() == 4 && time.is_ascii() && !time.contains(':') {
        format!("{}:{}", &time[..2], &time[2..])
    } else {
        time.to_string()
    };
    format!("{date} {time}").replace('-', "/")
}

fn column_str<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, SchemaError> {
    df.column(name)
        .map_err(|_| SchemaError::MissingColumn(name.to_string()))?
        .str()
        .map_err(SchemaError::DataFrame)
}
