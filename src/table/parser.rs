use crate::table::error::TableError;
use crate::table::metadata::{MetadataBlock, METADATA_LINES};
use calamine::{open_workbook_auto, Data, Reader};
use log::info;
use polars::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::task;

/// Lines skipped before the header row of a metadata-header file: the 7-line
/// metadata block plus one separator line.
const HEADER_SKIP_LINES: usize = METADATA_LINES + 1;

/// Parses an INMET station file: a 7-line `key;value` metadata preamble in a
/// legacy single-byte encoding, one skipped line, then a `;`-delimited table
/// with a header row. Every metadata key is broadcast onto the table as a
/// constant-valued column (metadata is file-scoped, rows are row-scoped).
pub async fn parse_with_metadata_header(path: &Path) -> Result<DataFrame, TableError> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || parse_with_metadata_header_sync(&path)).await?
}

fn parse_with_metadata_header_sync(path: &Path) -> Result<DataFrame, TableError> {
    let bytes = std::fs::read(path).map_err(|e| TableError::FileRead(path.to_path_buf(), e))?;
    // INMET publishes latin1-family text; transcode before handing polars UTF-8.
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);

    let metadata = MetadataBlock::parse(path, text.lines())?;

    let mut temp_file =
        NamedTempFile::new().map_err(|e| TableError::CsvReadIo(path.to_path_buf(), e))?;
    temp_file
        .write_all(text.as_bytes())
        .map_err(|e| TableError::CsvReadIo(path.to_path_buf(), e))?;
    temp_file
        .flush()
        .map_err(|e| TableError::CsvReadIo(path.to_path_buf(), e))?;

    let mut df = read_delimited(temp_file.path(), HEADER_SKIP_LINES)
        .map_err(|e| TableError::CsvReadPolars(path.to_path_buf(), e))?;

    // Explicit post-parse join of the table-scoped metadata into row scope.
    for (key, value) in metadata.entries() {
        df.with_column(Column::new(
            key.as_str().into(),
            vec![value.clone(); df.height()],
        ))?;
    }

    info!(
        "Parsed {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Parses a plain `;`-delimited CSV with a header row and no preamble.
pub async fn parse_plain_delimited(path: &Path) -> Result<DataFrame, TableError> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || {
        read_delimited(&path, 0).map_err(|e| TableError::CsvReadPolars(path.clone(), e))
    })
    .await?
}

fn read_delimited(path: &Path, skip_lines: usize) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(skip_lines)
        .map_parse_options(|opts| opts.with_separator(b';'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Parses the first sheet of a spreadsheet file, taking the first row as the
/// header. A column becomes Float64 when every non-empty cell is numeric,
/// otherwise String; datetime cells are rendered as `YYYY-MM-DD HH:MM:SS`.
pub async fn parse_spreadsheet(path: &Path) -> Result<DataFrame, TableError> {
    let path = path.to_path_buf();
    task::spawn_blocking(move || parse_spreadsheet_sync(&path)).await?
}

fn parse_spreadsheet_sync(path: &Path) -> Result<DataFrame, TableError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| TableError::SpreadsheetOpen(path.to_path_buf(), e))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TableError::EmptySpreadsheet(path.to_path_buf()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| TableError::SpreadsheetOpen(path.to_path_buf(), e))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| TableError::EmptySpreadsheet(path.to_path_buf()))?
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    let data: Vec<&[Data]> = rows.collect();

    let columns: Vec<Column> = header
        .iter()
        .enumerate()
        .map(|(col_idx, name)| build_column(name, col_idx, &data))
        .collect();

    let df = DataFrame::new(columns)?;
    info!(
        "Parsed {} rows x {} columns from sheet '{}' of {}",
        df.height(),
        df.width(),
        sheet,
        path.display()
    );
    Ok(df)
}

fn build_column(name: &str, col_idx: usize, rows: &[&[Data]]) -> Column {
    let mut any_numeric = false;
    let all_numeric = rows.iter().all(|row| {
        match row.get(col_idx) {
            Some(Data::Float(_)) | Some(Data::Int(_)) => {
                any_numeric = true;
                true
            }
            Some(Data::Empty) | None => true,
            _ => false,
        }
    });

    if all_numeric && any_numeric {
        let values: Vec<Option<f64>> = rows
            .iter()
            .map(|row| match row.get(col_idx) {
                Some(Data::Float(f)) => Some(*f),
                Some(Data::Int(i)) => Some(*i as f64),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|row| cell_to_string(row.get(col_idx)))
            .collect();
        Column::new(name.into(), values)
    }
}

fn cell_to_string(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A station file the way INMET ships them: 7 metadata lines, one skipped
    // line, a header, then data. Written as latin1 bytes (0xC7 = 'Ç').
    fn station_fixture() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"REGIAO:;SE\n");
        bytes.extend_from_slice(b"UF:;MG\n");
        bytes.extend_from_slice(b"ESTACAO:;BELO HORIZONTE - CERCADINHO\n");
        bytes.extend_from_slice(b"CODIGO (WMO):;A521\n");
        bytes.extend_from_slice(b"LATITUDE:;-19,98\n");
        bytes.extend_from_slice(b"LONGITUDE:;-43,95\n");
        bytes.extend_from_slice(b"ALTITUDE:;1199,57\n");
        bytes.extend_from_slice(b"DATA DE FUNDACAO:;2006-09-09\n");
        bytes.extend_from_slice(b"Data;Hora UTC;RADIA\xC7AO GLOBAL (Kj/m\xB2)\n");
        bytes.extend_from_slice(b"2021/05/03;1200 UTC;1433,1\n");
        bytes.extend_from_slice(b"2021/05/03;1300 UTC;1801,9\n");
        bytes
    }

    #[tokio::test]
    async fn metadata_keys_become_constant_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a521.csv");
        std::fs::write(&path, station_fixture()).unwrap();

        let df = parse_with_metadata_header(&path).await.unwrap();

        assert_eq!(df.height(), 2);
        // 3 data columns + 7 broadcast metadata columns
        assert_eq!(df.width(), 10);

        let uf = df.column("UF:").unwrap().str().unwrap();
        assert_eq!(uf.get(0), Some("MG"));
        assert_eq!(uf.get(1), Some("MG"));
        let station = df.column("ESTACAO:").unwrap().str().unwrap();
        assert_eq!(station.get(1), Some("BELO HORIZONTE - CERCADINHO"));
    }

    #[tokio::test]
    async fn latin1_header_bytes_are_transcoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a521.csv");
        std::fs::write(&path, station_fixture()).unwrap();

        let df = parse_with_metadata_header(&path).await.unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert!(
            names.iter().any(|n| n == "RADIAÇAO GLOBAL (Kj/m²)"),
            "columns: {names:?}"
        );
    }

    #[tokio::test]
    async fn malformed_metadata_fails_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, b"no separator here\nUF:;MG\n").unwrap();

        let err = parse_with_metadata_header(&path).await.unwrap_err();
        assert!(matches!(err, TableError::MalformedMetadata { line: 1, .. }));
    }

    #[tokio::test]
    async fn plain_delimited_parses_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geracao.csv");
        std::fs::write(
            &path,
            "din_instante;id_estado;val_geracao\n2021-01-01 00:00:00;MG;12.5\n2021-01-01 01:00:00;SP;7.25\n",
        )
        .unwrap();

        let df = parse_plain_delimited(&path).await.unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let generated = df.column("val_geracao").unwrap().f64().unwrap();
        assert_eq!(generated.get(1), Some(7.25));
    }

    #[tokio::test]
    async fn missing_spreadsheet_fails_with_path_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        let err = parse_spreadsheet(&path).await.unwrap_err();
        assert!(matches!(err, TableError::SpreadsheetOpen(p, _) if p == path));
    }
}
