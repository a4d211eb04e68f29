//! CSV dataset loading and timestamp normalisation.
//!
//! Reads a comma-separated resource with a header row into a [`Table`],
//! coerces the rainfall column to floating point and, when a timestamp
//! column is present, parses it into a chronological index. Any
//! unparseable timestamp fails the whole load.

use crate::config::AnalyticsConfig;
use crate::constants::{DATE_FORMATS, MISSING_VALUE_TOKENS, TIMESTAMP_FORMATS};
use crate::error::{RainflowError, Result};
use crate::models::{Observation, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Builds tables from CSV resources
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    rainfall_column: String,
    timestamp_column: String,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl DatasetLoader {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            rainfall_column: config.rainfall_column.clone(),
            timestamp_column: config.timestamp_column.clone(),
        }
    }

    /// Load a CSV file from disk
    pub fn load_path(&self, path: &Path) -> Result<Table> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RainflowError::DatasetNotFound {
                path: path.to_path_buf(),
            },
            _ => RainflowError::Io(e),
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.load_bytes(bytes)
    }

    /// Load CSV content from any reader
    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<Table> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.load_bytes(bytes)
    }

    /// Load CSV content already held in memory
    pub fn load_bytes(&self, bytes: Vec<u8>) -> Result<Table> {
        let null_values: Vec<PlSmallStr> = MISSING_VALUE_TOKENS
            .iter()
            .copied()
            .map(PlSmallStr::from_static)
            .collect();

        // Infer types from every row so late decimals do not fail an integer column
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|opts| {
                opts.with_null_values(Some(NullValues::AllColumns(null_values.clone())))
            })
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect();
        debug!("Parsed CSV with {} rows, columns {:?}", df.height(), columns);

        let rainfall = self.rainfall_values(&df)?;

        let has_timestamp = columns.iter().any(|c| c == &self.timestamp_column);
        if !has_timestamp {
            let rows = rainfall
                .into_iter()
                .map(|value| Observation::new(None, value))
                .collect();
            return Ok(Table::new(columns, rows));
        }

        let timestamps = self.timestamp_values(&df)?;
        let rows = timestamps
            .into_iter()
            .zip(rainfall)
            .map(|(ts, value)| Observation::new(Some(ts), value))
            .collect();

        Ok(Table::with_time_index(columns, rows))
    }

    fn rainfall_values(&self, df: &DataFrame) -> Result<Vec<Option<f64>>> {
        let column = df
            .column(&self.rainfall_column)
            .map_err(|_| RainflowError::MissingColumn {
                column: self.rainfall_column.clone(),
            })?;

        let series = column
            .as_materialized_series()
            .strict_cast(&DataType::Float64)
            .map_err(|e| RainflowError::NonNumericColumn {
                column: self.rainfall_column.clone(),
                reason: e.to_string(),
            })?;

        let values: Vec<Option<f64>> = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            warn!(
                "{} of {} rows have no {} value",
                missing,
                values.len(),
                self.rainfall_column
            );
        }

        Ok(values)
    }

    fn timestamp_values(&self, df: &DataFrame) -> Result<Vec<NaiveDateTime>> {
        let series = df
            .column(&self.timestamp_column)?
            .as_materialized_series()
            .cast(&DataType::String)?;

        series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value
                    .and_then(parse_timestamp)
                    .ok_or_else(|| RainflowError::InvalidTimestamp {
                        row,
                        value: value.unwrap_or_default().to_string(),
                    })
            })
            .collect()
    }
}

/// Parse a timestamp in any of the accepted layouts
///
/// Offsets in RFC 3339 values are dropped in favour of the local wall-clock
/// time so that month grouping follows the recorded date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load(csv: &str) -> Result<Table> {
        DatasetLoader::default().load_bytes(csv.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let dt = parse_timestamp("2024-06-15").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 6, 15));

        let dt = parse_timestamp("2024-06-15 13:45:00").unwrap();
        assert_eq!(dt.hour(), 13);

        let dt = parse_timestamp("2024-06-15T13:45:00+02:00").unwrap();
        assert_eq!(dt.hour(), 13);

        let dt = parse_timestamp("06/15/2024").unwrap();
        assert_eq!(dt.month(), 6);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_load_without_timestamp() {
        let table = load("rainfall,station\n1.5,a\n0,b\n3,c\n").unwrap();

        assert_eq!(table.len(), 3);
        assert!(!table.has_time_index());
        assert_eq!(table.columns(), &["rainfall".to_string(), "station".to_string()]);
        assert_eq!(table.rainfall_values(), vec![1.5, 0.0, 3.0]);
    }

    #[test]
    fn test_load_with_timestamp_sorts_rows() {
        let table = load("timestamp,rainfall\n2024-06-03,3\n2024-06-01,1\n2024-06-02,2\n").unwrap();

        assert!(table.has_time_index());
        assert_eq!(table.rainfall_values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_rainfall_column() {
        let result = load("timestamp,precip\n2024-06-01,1\n");
        assert!(matches!(result, Err(RainflowError::MissingColumn { .. })));
    }

    #[test]
    fn test_non_numeric_rainfall() {
        let result = load("rainfall\n1.0\nheavy\n2.0\n");
        assert!(matches!(result, Err(RainflowError::NonNumericColumn { .. })));
    }

    #[test]
    fn test_bad_timestamp_fails_whole_load() {
        let result = load("timestamp,rainfall\n2024-06-01,1\nnot-a-date,2\n2024-06-03,3\n");
        match result {
            Err(RainflowError::InvalidTimestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected timestamp failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_cells_become_missing_values() {
        let table = load("rainfall,station\n1.0,a\n,b\n2.0,c\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1].rainfall, None);
        assert_eq!(table.rainfall_values(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_na_tokens_become_missing_values() {
        let table = load("rainfall\n1.0\nNA\n0\nN/A\nnull\n").unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.rainfall_values(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_nan_is_missing_not_a_value() {
        let table = load("rainfall\n1.0\nNaN\n0\nnan\n").unwrap();
        assert_eq!(table.rows()[1].rainfall, None);
        assert_eq!(table.rows()[3].rainfall, None);
        assert_eq!(table.rainfall_values(), vec![1.0, 0.0]);
    }

    /// Purpose: type inference over long files
    /// Benefit: whole-mm readings early in the year do not reject later decimals
    #[test]
    fn test_decimals_after_many_integer_rows() {
        let mut csv = String::from("timestamp,rainfall\n");
        for day in 0..150 {
            csv.push_str(&format!("2024-01-01 {:02}:{:02},{}\n", day / 60, day % 60, day % 4));
        }
        csv.push_str("2024-01-02,2.5\n");

        let table = load(&csv).unwrap();
        assert_eq!(table.len(), 151);
        assert_eq!(table.rainfall_values().last(), Some(&2.5));
    }

    #[test]
    fn test_load_path_and_missing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "rainfall").unwrap();
        writeln!(file, "4.2").unwrap();

        let loader = DatasetLoader::default();
        let table = loader.load_path(file.path()).unwrap();
        assert_eq!(table.rainfall_values(), vec![4.2]);

        let missing = loader.load_path(Path::new("/nonexistent/rain.csv"));
        assert!(matches!(missing, Err(RainflowError::DatasetNotFound { .. })));
    }

    #[test]
    fn test_custom_column_names() {
        let config = AnalyticsConfig {
            rainfall_column: "prcp_amt".to_string(),
            timestamp_column: "ob_end_time".to_string(),
            ..Default::default()
        };
        let loader = DatasetLoader::new(&config);
        let table = loader
            .load_bytes(b"ob_end_time,prcp_amt\n2023-01-02,0.5\n2023-01-01,1.5\n".to_vec())
            .unwrap();

        assert!(table.has_time_index());
        assert_eq!(table.rainfall_values(), vec![1.5, 0.5]);
    }
}
