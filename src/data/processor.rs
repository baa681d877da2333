//! Data Processor Module
//! Handles data cleaning: median imputation and timestamp derivation.

use super::model::{
    compose_timestamp, measurement_columns, AirQualityDataset, DatasetError, DATETIME_COLUMN,
};
use crate::stats::StatsCalculator;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' has no observed values to take a median from")]
    NoObservations(String),
    #[error("Row {row}: {year}-{month}-{day} hour {hour} is not a valid timestamp")]
    InvalidTimestamp {
        row: usize,
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
    },
}

/// Outcome of median-filling one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    pub column: String,
    pub median: f64,
    pub filled: usize,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Clean a freshly loaded dataset: fill every measurement gap with its
    /// column median, then derive the `datetime` column.
    pub fn preprocess(dataset: &mut AirQualityDataset) -> Result<Vec<ColumnFill>, ProcessorError> {
        let fills = Self::fill_missing_with_median(dataset)?;
        Self::derive_datetime(dataset)?;

        let filled: usize = fills.iter().map(|f| f.filled).sum();
        log::info!(
            "Preprocessed {} rows: {} missing values filled across {} columns",
            dataset.height(),
            filled,
            fills.len()
        );
        Ok(fills)
    }

    /// Replace missing measurements with the median of the observed values
    /// in the same column.
    ///
    /// All medians are taken from the data as passed in, before any column
    /// is rewritten.
    pub fn fill_missing_with_median(
        dataset: &mut AirQualityDataset,
    ) -> Result<Vec<ColumnFill>, ProcessorError> {
        let mut planned = Vec::new();
        for name in measurement_columns() {
            let values = dataset.float_values(name)?;
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            let median = match StatsCalculator::median(&observed) {
                Some(m) => m,
                None if values.is_empty() => f64::NAN,
                None => return Err(ProcessorError::NoObservations(name.to_string())),
            };
            planned.push((name, median, values));
        }

        let mut fills = Vec::with_capacity(planned.len());
        for (name, median, values) in planned {
            let filled = values.iter().filter(|v| v.is_none()).count();
            let cleaned: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(median)).collect();
            dataset.set_column(Column::new(name.into(), cleaned))?;

            log::debug!("{name}: median {median}, {filled} values filled");
            fills.push(ColumnFill {
                column: name.to_string(),
                median,
                filled,
            });
        }

        Ok(fills)
    }

    /// Compose year/month/day/hour into the `datetime` column.
    pub fn derive_datetime(dataset: &mut AirQualityDataset) -> Result<(), ProcessorError> {
        let years = dataset.int_values("year")?;
        let months = dataset.int_values("month")?;
        let days = dataset.int_values("day")?;
        let hours = dataset.int_values("hour")?;

        let mut stamps: Vec<NaiveDateTime> = Vec::with_capacity(years.len());
        for row in 0..years.len() {
            let (year, month, day, hour) = (
                years[row].unwrap_or_default(),
                months[row].unwrap_or_default(),
                days[row].unwrap_or_default(),
                hours[row].unwrap_or_default(),
            );
            let stamp = compose_timestamp(year, month, day, hour).ok_or(
                ProcessorError::InvalidTimestamp {
                    row,
                    year,
                    month,
                    day,
                    hour,
                },
            )?;
            stamps.push(stamp);
        }

        dataset.set_column(Column::new(DATETIME_COLUMN.into(), stamps))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn hour(h: i32) -> Record {
        Record::new(2013, 3, 1, h)
    }

    fn complete(record: Record) -> Record {
        measurement_columns().fold(record, |r, name| {
            let value = r.measurement(name).or(Some(1.0));
            r.with(name, value)
        })
    }

    #[test]
    fn fills_pm25_gap_with_median() {
        let mut dataset = AirQualityDataset::from_records(&[
            complete(hour(0).with("PM2.5", Some(10.0))),
            complete(hour(1).with("PM2.5", Some(40.0))),
            complete(hour(2)).with("PM2.5", None),
        ])
        .unwrap();

        let fills = DataProcessor::preprocess(&mut dataset).unwrap();

        assert_eq!(
            dataset.float_values("PM2.5").unwrap(),
            vec![Some(10.0), Some(40.0), Some(25.0)]
        );
        let pm25 = fills.iter().find(|f| f.column == "PM2.5").unwrap();
        assert_eq!(pm25.median, 25.0);
        assert_eq!(pm25.filled, 1);
    }

    #[test]
    fn every_measurement_column_is_complete_afterwards() {
        let mut dataset = AirQualityDataset::from_records(&[
            hour(0).with("PM2.5", Some(3.0)).with("TEMP", Some(-2.0)),
            hour(1).with("PM10", Some(6.0)).with("SO2", Some(4.0)),
            hour(2)
                .with("NO2", Some(7.0))
                .with("CO", Some(300.0))
                .with("O3", Some(77.0))
                .with("PRES", Some(1023.0))
                .with("DEWP", Some(-18.8))
                .with("RAIN", Some(0.0))
                .with("WSPM", Some(4.4)),
        ])
        .unwrap();

        let fills = DataProcessor::preprocess(&mut dataset).unwrap();

        assert_eq!(fills.len(), 11);
        for name in measurement_columns() {
            let values = dataset.float_values(name).unwrap();
            assert!(values.iter().all(Option::is_some), "{name} still has gaps");
        }
    }

    #[test]
    fn medians_are_independent_per_column() {
        let mut dataset = AirQualityDataset::from_records(&[
            complete(hour(0).with("PM2.5", Some(10.0))).with("PM10", None),
            complete(hour(1).with("PM2.5", Some(40.0)).with("PM10", Some(100.0))),
            complete(hour(2).with("PM10", Some(300.0))).with("PM2.5", None),
            complete(hour(3).with("PM10", Some(500.0))).with("PM2.5", None),
        ])
        .unwrap();

        let fills = DataProcessor::fill_missing_with_median(&mut dataset).unwrap();

        // PM2.5 median comes from [10, 40] only, PM10 from [100, 300, 500] only.
        assert_eq!(
            dataset.float_values("PM2.5").unwrap(),
            vec![Some(10.0), Some(40.0), Some(25.0), Some(25.0)]
        );
        assert_eq!(
            dataset.float_values("PM10").unwrap(),
            vec![Some(300.0), Some(100.0), Some(300.0), Some(500.0)]
        );
        let medians: Vec<(String, f64)> =
            fills.iter().map(|f| (f.column.clone(), f.median)).take(2).collect();
        assert_eq!(
            medians,
            vec![("PM2.5".to_string(), 25.0), ("PM10".to_string(), 300.0)]
        );
        assert!(fills.iter().skip(2).all(|f| f.filled == 0 && f.median == 1.0));
    }

    #[test]
    fn preprocessing_is_idempotent() {
        let mut dataset = AirQualityDataset::from_records(&[
            complete(hour(0).with("PM2.5", Some(12.0))),
            complete(hour(1)).with("PM2.5", None).with("RAIN", None),
            complete(hour(2).with("PM2.5", Some(80.0)).with("RAIN", Some(0.3))),
        ])
        .unwrap();

        DataProcessor::preprocess(&mut dataset).unwrap();
        let once = dataset.records().unwrap();

        let fills = DataProcessor::preprocess(&mut dataset).unwrap();
        assert!(fills.iter().all(|f| f.filled == 0));
        assert_eq!(dataset.records().unwrap(), once);
    }

    #[test]
    fn derives_datetime_from_parts() {
        let mut dataset = AirQualityDataset::from_records(&[
            complete(Record::new(2013, 3, 1, 0)),
            complete(Record::new(2013, 3, 1, 23)),
        ])
        .unwrap();

        DataProcessor::preprocess(&mut dataset).unwrap();

        let records = dataset.records().unwrap();
        assert_eq!(
            records[1].datetime.map(|d| d.to_string()),
            Some("2013-03-01 23:00:00".to_string())
        );
        assert!(dataset.has_column(DATETIME_COLUMN));
    }

    #[test]
    fn impossible_date_is_rejected() {
        let mut dataset =
            AirQualityDataset::from_records(&[complete(Record::new(2014, 2, 30, 0))]).unwrap();

        assert!(matches!(
            DataProcessor::preprocess(&mut dataset),
            Err(ProcessorError::InvalidTimestamp { row: 0, day: 30, .. })
        ));
    }

    #[test]
    fn column_without_observations_is_rejected() {
        let mut dataset = AirQualityDataset::from_records(&[
            complete(hour(0)).with("O3", None),
            complete(hour(1)).with("O3", None),
        ])
        .unwrap();

        assert!(matches!(
            DataProcessor::preprocess(&mut dataset),
            Err(ProcessorError::NoObservations(ref name)) if name == "O3"
        ));
    }

    #[test]
    fn absent_column_propagates_schema_error() {
        let mut dataset = AirQualityDataset::new(
            polars::df!("year" => [2013], "month" => [3], "day" => [1], "hour" => [0]).unwrap(),
        );

        assert!(matches!(
            DataProcessor::preprocess(&mut dataset),
            Err(ProcessorError::Dataset(DatasetError::MissingColumn(ref name))) if name == "PM2.5"
        ));
    }
}
