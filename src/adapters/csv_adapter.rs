//! CSV file series adapter.
//!
//! Reads `<base>/<SYMBOL>.csv` with a header row. The date column is
//! `date`; the value column is the first of `value`, `nav` or `close`.
//! Dates are `%Y-%m-%d`, or `%d-%m-%Y` as published by fund NAV feeds.

use crate::domain::error::AnalysisError;
use crate::domain::instrument::Instrument;
use crate::domain::series::{Observation, TimeSeries};
use crate::ports::series_port::SeriesPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];
const VALUE_COLUMNS: [&str; 3] = ["value", "nav", "close"];

pub struct CsvSeriesAdapter {
    base_path: PathBuf,
}

impl CsvSeriesAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<base>/<symbol>.csv`, or the file whose stem matches the symbol
    /// ignoring ASCII case. Symbols are uppercased but file names need not be.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
            .unwrap_or(exact)
    }

    /// Symbols with a CSV file in the base directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, AnalysisError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AnalysisError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AnalysisError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

impl SeriesPort for CsvSeriesAdapter {
    fn fetch_series(&self, instrument: &Instrument) -> Result<TimeSeries, AnalysisError> {
        let path = self.csv_path(&instrument.symbol);
        let content = fs::read_to_string(&path).map_err(|e| AnalysisError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| AnalysisError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        };
        let date_idx = column("date").ok_or_else(|| AnalysisError::Data {
            reason: format!("missing date column in {}", path.display()),
        })?;
        let value_idx = VALUE_COLUMNS
            .iter()
            .find_map(|name| column(name))
            .ok_or_else(|| AnalysisError::Data {
                reason: format!("missing value column in {}", path.display()),
            })?;

        let mut observations = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| AnalysisError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| AnalysisError::Data {
                reason: format!("invalid date '{}' on row {}", date_str, line + 1),
            })?;

            let value_str = record.get(value_idx).unwrap_or_default();
            let value: f64 = value_str.parse().map_err(|e| AnalysisError::Data {
                reason: format!("invalid value '{}' on row {}: {}", value_str, line + 1, e),
            })?;

            observations.push(Observation::new(date, value));
        }

        debug!(
            symbol = %instrument.symbol,
            path = %path.display(),
            rows = observations.len(),
            "series loaded"
        );
        Ok(TimeSeries::new(instrument.clone(), observations))
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
