use crate::dataset::error::DatasetError;
use crate::dataset::report::{BatchId, BatchOutcome, BatchReport};
use crate::error::EnergimetError;
use crate::fetch::archive::extract_zip;
use crate::fetch::fetcher::{FetchOutcome, RemoteFetcher};
use crate::schema::normalize::{
    filter_and_drop, select_and_rename, WEATHER_CANONICAL_ORDER, WEATHER_FIELD_NAMES,
    WEATHER_ORDINALS,
};
use crate::schema::timestamp::reconcile;
use crate::table::parser::{parse_plain_delimited, parse_spreadsheet, parse_with_metadata_header};
use chrono::{Datelike, Utc};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dataset-specific constants of the pipeline. The year-range filter and the
/// format-change boundary are tied to when the upstream providers changed
/// their delivery formats; they will move again, so they are configuration,
/// not code.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// First year for which generation data ships as monthly spreadsheets
    /// instead of one yearly CSV.
    pub format_boundary_year: i32,
    /// Closed year range retained by timestamp reconciliation.
    pub keep_years: (i32, i32),
    /// Plant technology class kept by the generation filter.
    pub technology: String,
    /// State code kept by the generation filter.
    pub state: String,
    pub generation_base_url: String,
    pub weather_base_url: String,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            format_boundary_year: 2022,
            keep_years: (2019, 2023),
            technology: "FOTOVOLTAICA".to_string(),
            state: "MG".to_string(),
            generation_base_url:
                "https://ons-aws-prod-opendata.s3.amazonaws.com/dataset/geracao_usina_2_ho"
                    .to_string(),
            weather_base_url: "https://portal.inmet.gov.br/uploads/dadoshistoricos".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    fn generation_csv_url(&self, year: i32) -> String {
        format!("{}/GERACAO_USINA_{}.csv", self.generation_base_url, year)
    }

    fn generation_xlsx_url(&self, year: i32, month: u32) -> String {
        format!(
            "{}/GERACAO_USINA-2_{}_{:02}.xlsx",
            self.generation_base_url, year, month
        )
    }

    fn weather_zip_url(&self, year: i32) -> String {
        format!("{}/{}.zip", self.weather_base_url, year)
    }
}

/// Which of the two sources to build a dataset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// ONS plant generation records.
    Generation,
    /// INMET weather station records.
    Weather,
}

/// A merged multi-year dataset plus the per-batch outcomes that produced it.
#[derive(Debug)]
pub struct Dataset {
    pub frame: DataFrame,
    pub report: BatchReport,
}

pub struct DatasetBuilder {
    config: PipelineConfig,
    fetcher: RemoteFetcher,
}

impl DatasetBuilder {
    pub fn new(config: PipelineConfig) -> Result<Self, EnergimetError> {
        let fetcher = RemoteFetcher::new(config.request_timeout)?;
        Ok(Self { config, fetcher })
    }

    pub fn with_defaults() -> Result<Self, EnergimetError> {
        Self::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetches, parses and normalizes every batch in
    /// `start_year ..= min(end_year, current_year - 1)` and concatenates the
    /// survivors in fetch order. Per-batch problems are logged and recorded in
    /// the report; only an entirely empty result or invalid parameters fail.
    pub async fn build_dataset(
        &self,
        start_year: i32,
        end_year: i32,
        dest_dir: &Path,
        kind: DatasetKind,
    ) -> Result<Dataset, DatasetError> {
        if start_year > end_year {
            return Err(DatasetError::InvalidRange {
                start: start_year,
                end: end_year,
            });
        }
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| DatasetError::DestDirCreation(dest_dir.to_path_buf(), e))?;

        // The current year is never fetched: its archives are still being
        // published and would yield a misleading partial year.
        let current_year = Utc::now().year();
        let last_year = end_year.min(current_year - 1);

        let mut report = BatchReport::default();
        let mut frames: Vec<LazyFrame> = Vec::new();

        for year in start_year..=last_year {
            info!("Processing year {} ({:?})", year, kind);
            match kind {
                DatasetKind::Generation if year >= self.config.format_boundary_year => {
                    for month in 1..=12 {
                        let id = BatchId {
                            year,
                            month: Some(month),
                        };
                        let result = self.generation_month_batch(year, month, dest_dir).await;
                        record_batch(id, result, &mut frames, &mut report);
                    }
                }
                DatasetKind::Generation => {
                    let id = BatchId { year, month: None };
                    let result = self.generation_year_batch(year, dest_dir).await;
                    record_batch(id, result, &mut frames, &mut report);
                }
                DatasetKind::Weather => {
                    let id = BatchId { year, month: None };
                    let result = self.weather_year_batch(year, dest_dir).await;
                    record_batch(id, result, &mut frames, &mut report);
                }
            }
        }

        if frames.is_empty() {
            return Err(DatasetError::EmptyDataset {
                start: start_year,
                end: end_year,
            });
        }

        // Diagonal union: the pre- and post-boundary generation schemas may
        // differ in column order.
        let frame = concat(
            frames,
            UnionArgs {
                diagonal: true,
                ..Default::default()
            },
        )?
        .collect()?;

        info!(
            "Built dataset with {} rows from {} loaded batches ({} missing, {} failed)",
            frame.height(),
            report.loaded_batches(),
            report.missing_batches(),
            report.failed_batches()
        );
        Ok(Dataset { frame, report })
    }

    async fn generation_year_batch(
        &self,
        year: i32,
        dest_dir: &Path,
    ) -> Result<Option<DataFrame>, EnergimetError> {
        let url = self.config.generation_csv_url(year);
        let dest = dest_dir.join(format!("GERACAO_USINA_{year}.csv"));
        match self.fetcher.fetch(&url, &dest).await? {
            FetchOutcome::NotFound => Ok(None),
            FetchOutcome::Fetched(_) => {
                let df = parse_plain_delimited(&dest).await?;
                let df = filter_and_drop(&df, &self.config.technology, &self.config.state)?;
                Ok(Some(df))
            }
        }
    }

    async fn generation_month_batch(
        &self,
        year: i32,
        month: u32,
        dest_dir: &Path,
    ) -> Result<Option<DataFrame>, EnergimetError> {
        let url = self.config.generation_xlsx_url(year, month);
        let dest = dest_dir.join(format!("GERACAO_USINA-2_{year}_{month:02}.xlsx"));
        match self.fetcher.fetch(&url, &dest).await? {
            FetchOutcome::NotFound => Ok(None),
            FetchOutcome::Fetched(_) => {
                let df = parse_spreadsheet(&dest).await?;
                let df = filter_and_drop(&df, &self.config.technology, &self.config.state)?;
                Ok(Some(df))
            }
        }
    }

    /// One weather batch is a yearly archive of per-station CSVs; each file is
    /// parsed, normalized and reconciled, and the station tables are stacked.
    /// A fetched archive always counts as a loaded batch, even when every row
    /// falls outside the year filter; `None` is reserved for HTTP 404.
    async fn weather_year_batch(
        &self,
        year: i32,
        dest_dir: &Path,
    ) -> Result<Option<DataFrame>, EnergimetError> {
        let url = self.config.weather_zip_url(year);
        let dest = dest_dir.join(format!("{year}.zip"));
        let bytes = match self.fetcher.fetch(&url, &dest).await? {
            FetchOutcome::NotFound => return Ok(None),
            FetchOutcome::Fetched(bytes) => bytes,
        };

        let extract_dir = dest_dir.join(year.to_string());
        let files = extract_zip(bytes, &extract_dir).await?;
        let stacked = self.normalize_station_files(&files).await?;
        Ok(Some(stacked))
    }

    /// Parses, normalizes and reconciles every station CSV of one extracted
    /// archive and stacks the results. The stack may have zero rows; an
    /// archive without station files yields an empty frame.
    async fn normalize_station_files(
        &self,
        files: &[PathBuf],
    ) -> Result<DataFrame, EnergimetError> {
        let mut station_frames: Vec<LazyFrame> = Vec::new();
        for file in files.iter().filter(|f| is_csv(f)) {
            let raw = parse_with_metadata_header(file).await?;
            let canonical = select_and_rename(
                &raw,
                &WEATHER_ORDINALS,
                &WEATHER_FIELD_NAMES,
                &WEATHER_CANONICAL_ORDER,
            )?;
            let reconciled = reconcile(&canonical, self.config.keep_years)?;
            station_frames.push(reconciled.lazy());
        }

        if station_frames.is_empty() {
            return Ok(DataFrame::empty());
        }
        let stacked = concat(station_frames, UnionArgs::default())
            .map_err(DatasetError::Concat)?
            .collect()
            .map_err(DatasetError::Concat)?;
        Ok(stacked)
    }
}

fn is_csv(path: &PathBuf) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn record_batch(
    id: BatchId,
    result: Result<Option<DataFrame>, EnergimetError>,
    frames: &mut Vec<LazyFrame>,
    report: &mut BatchReport,
) {
    match result {
        Ok(Some(df)) => {
            info!("Batch {}: loaded {} rows", id, df.height());
            report.record(id, BatchOutcome::Loaded { rows: df.height() });
            if df.height() > 0 {
                frames.push(df.lazy());
            }
        }
        Ok(None) => {
            warn!("Batch {}: resource not available, skipping", id);
            report.record(id, BatchOutcome::NotFound);
        }
        Err(e) => {
            warn!("Batch {}: failed, skipping: {}", id, e);
            report.record(
                id,
                BatchOutcome::Failed {
                    reason: e.to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::timestamp::TIMESTAMP_COLUMN;

    /// Writes a station file shaped like the extracted archives: 7 metadata
    /// lines, one skipped line, a 20-column header, two data rows at `date`.
    /// With the 7 broadcast columns the parsed table has 27 columns, matching
    /// the ordinal mapping.
    fn station_file(dir: &Path, date: &str) -> PathBuf {
        let mut text = String::from(
            "REGIAO:;SE\nUF:;MG\nESTACAO:;CERCADINHO\nCODIGO (WMO):;A521\n\
             LATITUDE:;-19,98\nLONGITUDE:;-43,95\nALTITUDE:;1199,57\n\
             DATA DE FUNDACAO:;2006-09-09\n",
        );
        let header: Vec<String> = (0..20).map(|i| format!("c{i}")).collect();
        text.push_str(&header.join(";"));
        text.push('\n');
        for time in ["1200 UTC", "1300 UTC"] {
            let mut row = vec![date.to_string(), time.to_string()];
            row.extend((2..20).map(|i| format!("v{i}")));
            text.push_str(&row.join(";"));
            text.push('\n');
        }
        let path = dir.join("a521.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[tokio::test]
    async fn in_range_station_rows_survive_normalization() {
        let builder = DatasetBuilder::with_defaults().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = station_file(dir.path(), "2021/05/03");

        let df = builder.normalize_station_files(&[path]).await.unwrap();

        assert_eq!(df.height(), 2);
        let station = df.column("estacao").unwrap().str().unwrap();
        assert_eq!(station.get(0), Some("CERCADINHO"));
    }

    #[tokio::test]
    async fn out_of_range_station_rows_yield_an_empty_stack_not_a_missing_one() {
        let builder = DatasetBuilder::with_defaults().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = station_file(dir.path(), "2017/01/01");

        let df = builder.normalize_station_files(&[path]).await.unwrap();

        // Zero rows, but the batch was fetched and parsed: the canonical
        // schema is intact and the caller records it as loaded.
        assert_eq!(df.height(), 0);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert!(names.iter().any(|n| n == TIMESTAMP_COLUMN));
        assert!(names.iter().any(|n| n == "estacao"));
    }

    #[tokio::test]
    async fn archive_without_station_files_yields_an_empty_frame() {
        let builder = DatasetBuilder::with_defaults().unwrap();
        let df = builder.normalize_station_files(&[]).await.unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn zero_row_batch_is_recorded_as_loaded() {
        let mut frames = Vec::new();
        let mut report = BatchReport::default();

        record_batch(
            BatchId {
                year: 2017,
                month: None,
            },
            Ok(Some(DataFrame::empty())),
            &mut frames,
            &mut report,
        );

        assert!(frames.is_empty());
        assert_eq!(report.loaded_batches(), 1);
        assert_eq!(report.missing_batches(), 0);
        assert_eq!(
            report.entries()[0].1,
            BatchOutcome::Loaded { rows: 0 }
        );
    }

    #[tokio::test]
    async fn start_after_end_is_an_invalid_range() {
        let builder = DatasetBuilder::with_defaults().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = builder
            .build_dataset(2023, 2020, dir.path(), DatasetKind::Generation)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRange {
                start: 2023,
                end: 2020
            }
        ));
    }

    #[tokio::test]
    async fn range_entirely_in_the_future_yields_empty_dataset() {
        let builder = DatasetBuilder::with_defaults().unwrap();
        let dir = tempfile::tempdir().unwrap();

        // Clamping to current_year - 1 leaves nothing to fetch, so the loop
        // never touches the network.
        let next_year = Utc::now().year() + 1;
        let err = builder
            .build_dataset(next_year, next_year + 1, dir.path(), DatasetKind::Weather)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyDataset { .. }));
    }

    #[test]
    fn default_config_carries_the_documented_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.format_boundary_year, 2022);
        assert_eq!(config.keep_years, (2019, 2023));
        assert_eq!(config.technology, "FOTOVOLTAICA");
        assert_eq!(config.state, "MG");
        assert_eq!(
            config.generation_xlsx_url(2023, 4),
            "https://ons-aws-prod-opendata.s3.amazonaws.com/dataset/geracao_usina_2_ho/GERACAO_USINA-2_2023_04.xlsx"
        );
        assert_eq!(
            config.weather_zip_url(2021),
            "https://portal.inmet.gov.br/uploads/dadoshistoricos/2021.zip"
        );
    }

    #[test]
    fn record_batch_tracks_all_outcomes() {
        let mut frames = Vec::new();
        let mut report = BatchReport::default();
        let df = DataFrame::new(vec![Column::new("v".into(), vec![1i64, 2])]).unwrap();

        record_batch(
            BatchId {
                year: 2020,
                month: None,
            },
            Ok(Some(df)),
            &mut frames,
            &mut report,
        );
        record_batch(
            BatchId {
                year: 2021,
                month: None,
            },
            Ok(None),
            &mut frames,
            &mut report,
        );
        record_batch(
            BatchId {
                year: 2022,
                month: Some(1),
            },
            Err(EnergimetError::DataDirResolution),
            &mut frames,
            &mut report,
        );

        assert_eq!(frames.len(), 1);
        assert_eq!(report.loaded_batches(), 1);
        assert_eq!(report.missing_batches(), 1);
        assert_eq!(report.failed_batches(), 1);
        assert_eq!(report.total_rows(), 2);
    }
}
