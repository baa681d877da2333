//! CSV Data Loader Module
//! Reads the station CSV with Polars and types the known columns.

use super::model::{measurement_columns, AirQualityDataset, DATE_COLUMNS};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cell text treated as a missing measurement.
const MISSING_MARKERS: [&str; 4] = ["NA", "NaN", "nan", "null"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Cannot parse '{value}' in column '{column}' at line {line}")]
    Parse {
        column: String,
        line: usize,
        value: String,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Loads the hourly station CSV.
pub struct DataLoader;

impl DataLoader {
    /// Load and type a station CSV file.
    ///
    /// Every column is read as text first so an unparsable cell can be
    /// reported with its column and line instead of a bare Polars error.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<AirQualityDataset, LoaderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        let raw = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let dataset = Self::parse_frame(&raw)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.height(),
            dataset.dataframe().width(),
            path.display()
        );
        Ok(dataset)
    }

    /// Type a raw frame: date parts become Int32, measurements Float64 with
    /// nulls for missing cells. Other columns pass through untouched and
    /// column order is preserved.
    pub fn parse_frame(raw: &DataFrame) -> Result<AirQualityDataset, LoaderError> {
        for name in DATE_COLUMNS.iter().copied().chain(measurement_columns()) {
            if raw.column(name).is_err() {
                return Err(LoaderError::MissingColumn(name.to_string()));
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(raw.width());
        for column in raw.get_columns() {
            let name = column.name().as_str();
            if DATE_COLUMNS.contains(&name) {
                let values = Self::parse_cells(column, |text| {
                    text.and_then(|t| t.trim().parse::<i32>().ok())
                        .ok_or(())
                })?;
                columns.push(Column::new(name.into(), values));
            } else if measurement_columns().any(|m| m == name) {
                let values = Self::parse_cells(column, Self::parse_measurement)?;
                columns.push(Column::new(name.into(), values));
            } else {
                columns.push(column.clone());
            }
        }

        Ok(AirQualityDataset::new(DataFrame::new(columns)?))
    }

    /// Parse one measurement cell. `Ok(None)` means missing.
    fn parse_measurement(text: Option<&str>) -> Result<Option<f64>, ()> {
        let Some(text) = text.map(str::trim) else {
            return Ok(None);
        };
        if text.is_empty() || MISSING_MARKERS.contains(&text) {
            return Ok(None);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(None),
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(()),
        }
    }

    fn parse_cells<T>(
        column: &Column,
        parse: impl Fn(Option<&str>) -> Result<T, ()>,
    ) -> Result<Vec<T>, LoaderError> {
        let text = column.cast(&DataType::String)?;
        let ca = text.as_materialized_series().str()?;

        ca.into_iter()
            .enumerate()
            .map(|(i, cell)| {
                parse(cell).map_err(|_| LoaderError::Parse {
                    column: column.name().to_string(),
                    // header is line 1
                    line: i + 2,
                    value: cell.unwrap_or_default().to_string(),
                })
            })
            .collect()
    }
}
