//! SQLite sink for normalized datasets: load a DataFrame into a table, read
//! arbitrary queries back as DataFrames. No migrations, no domain logic.

use chrono::DateTime;
use log::info;
use polars::prelude::*;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database operation failed")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Column '{column}' has unsupported type {dtype} for SQLite storage")]
    UnsupportedDtype { column: String, dtype: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates `table` from the frame's schema (if absent) and inserts every
    /// row in a single transaction.
    pub fn load_frame(&mut self, table: &str, df: &DataFrame) -> Result<(), StoreError> {
        let column_defs: Vec<String> = df
            .get_columns()
            .iter()
            .map(|c| {
                let sql_type = sqlite_type(c.dtype()).ok_or_else(|| {
                    StoreError::UnsupportedDtype {
                        column: c.name().to_string(),
                        dtype: c.dtype().to_string(),
                    }
                })?;
                Ok(format!("\"{}\" {}", c.name(), sql_type))
            })
            .collect::<Result<_, StoreError>>()?;

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            table,
            column_defs.join(", ")
        );
        self.conn.execute(&create_sql, [])?;

        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect();
        let placeholders = vec!["?"; df.width()].join(", ");
        let insert_sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            column_names.join(", "),
            placeholders
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in 0..df.height() {
                let values: Vec<SqlValue> = df
                    .get_columns()
                    .iter()
                    .map(|c| c.get(row).map(any_value_to_sql))
                    .collect::<Result<_, PolarsError>>()?;
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        info!("Loaded {} rows into table '{}'", df.height(), table);
        Ok(())
    }

    /// Runs a read query and rebuilds a DataFrame from the result set.
    /// Integer-only result columns come back as Int64, numeric ones as
    /// Float64, everything else as String.
    pub fn query(&self, sql: &str) -> Result<DataFrame, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut grid: Vec<Vec<SqlValue>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in grid.iter_mut().enumerate() {
                column.push(row.get::<_, SqlValue>(idx)?);
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(grid)
            .map(|(name, values)| column_from_values(name, values))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn sqlite_type(dtype: &DataType) -> Option<&'static str> {
    match dtype {
        DataType::String => Some("TEXT"),
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some("INTEGER"),
        DataType::Float32 | DataType::Float64 => Some("REAL"),
        // Timestamps travel as ISO text; SQLite has no native datetime type.
        DataType::Date | DataType::Datetime(_, _) => Some("TEXT"),
        _ => None,
    }
}

fn any_value_to_sql(value: AnyValue) -> SqlValue {
    match value {
        AnyValue::Null => SqlValue::Null,
        AnyValue::Boolean(b) => SqlValue::Integer(b as i64),
        AnyValue::String(s) => SqlValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => SqlValue::Text(s.to_string()),
        AnyValue::Int8(v) => SqlValue::Integer(v as i64),
        AnyValue::Int16(v) => SqlValue::Integer(v as i64),
        AnyValue::Int32(v) => SqlValue::Integer(v as i64),
        AnyValue::Int64(v) => SqlValue::Integer(v),
        AnyValue::UInt8(v) => SqlValue::Integer(v as i64),
        AnyValue::UInt16(v) => SqlValue::Integer(v as i64),
        AnyValue::UInt32(v) => SqlValue::Integer(v as i64),
        AnyValue::UInt64(v) => SqlValue::Integer(v as i64),
        AnyValue::Float32(v) => SqlValue::Real(v as f64),
        AnyValue::Float64(v) => SqlValue::Real(v),
        AnyValue::Datetime(v, unit, _) => SqlValue::Text(render_timestamp(v, unit)),
        AnyValue::DatetimeOwned(v, unit, _) => SqlValue::Text(render_timestamp(v, unit)),
        other => SqlValue::Text(other.to_string()),
    }
}

fn render_timestamp(value: i64, unit: TimeUnit) -> String {
    let millis = match unit {
        TimeUnit::Milliseconds => value,
        TimeUnit::Microseconds => value / 1_000,
        TimeUnit::Nanoseconds => value / 1_000_000,
    };
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn column_from_values(name: &str, values: Vec<SqlValue>) -> Column {
    let mut any_value = false;
    let mut all_integer = true;
    let mut all_numeric = true;
    for value in &values {
        match value {
            SqlValue::Null => {}
            SqlValue::Integer(_) => any_value = true,
            SqlValue::Real(_) => {
                any_value = true;
                all_integer = false;
            }
            _ => {
                any_value = true;
                all_integer = false;
                all_numeric = false;
            }
        }
    }

    if any_value && all_integer {
        let ints: Vec<Option<i64>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Integer(i) => Some(i),
                _ => None,
            })
            .collect();
        Column::new(name.into(), ints)
    } else if any_value && all_numeric {
        let floats: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Integer(i) => Some(i as f64),
                SqlValue::Real(f) => Some(f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), floats)
    } else {
        let texts: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Null => None,
                SqlValue::Integer(i) => Some(i.to_string()),
                SqlValue::Real(f) => Some(f.to_string()),
                SqlValue::Text(s) => Some(s),
                SqlValue::Blob(b) => Some(String::from_utf8_lossy(&b).to_string()),
            })
            .collect();
        Column::new(name.into(), texts)
    }
}
