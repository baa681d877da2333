//! Dataset Model Module
//! Column schema, typed records and the DataFrame-backed dataset.

use crate::stats::Pm25Category;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Calendar parts of every observation, in file order.
pub const DATE_COLUMNS: [&str; 4] = ["year", "month", "day", "hour"];

/// Pollutant concentrations.
pub const POLLUTANT_COLUMNS: [&str; 6] = ["PM2.5", "PM10", "SO2", "NO2", "CO", "O3"];

/// Weather readings.
pub const WEATHER_COLUMNS: [&str; 5] = ["TEMP", "PRES", "DEWP", "RAIN", "WSPM"];

pub const PM25_COLUMN: &str = "PM2.5";
pub const TEMP_COLUMN: &str = "TEMP";

/// Derived by the preprocessor.
pub const DATETIME_COLUMN: &str = "datetime";

/// Derived by the classifier.
pub const CATEGORY_COLUMN: &str = "PM2.5_Category";

/// The eleven measurement columns that are median-filled.
pub fn measurement_columns() -> impl Iterator<Item = &'static str> {
    POLLUTANT_COLUMNS.iter().chain(WEATHER_COLUMNS.iter()).copied()
}

/// Compose the hourly timestamp of an observation.
///
/// Returns `None` when the parts do not name a real calendar hour.
pub fn compose_timestamp(year: i32, month: i32, day: i32, hour: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        year,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?
    .and_hms_opt(u32::try_from(hour).ok()?, 0, 0)
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One hourly observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,
    #[serde(rename = "SO2")]
    pub so2: Option<f64>,
    #[serde(rename = "NO2")]
    pub no2: Option<f64>,
    #[serde(rename = "CO")]
    pub co: Option<f64>,
    #[serde(rename = "O3")]
    pub o3: Option<f64>,
    #[serde(rename = "TEMP")]
    pub temp: Option<f64>,
    #[serde(rename = "PRES")]
    pub pres: Option<f64>,
    #[serde(rename = "DEWP")]
    pub dewp: Option<f64>,
    #[serde(rename = "RAIN")]
    pub rain: Option<f64>,
    #[serde(rename = "WSPM")]
    pub wspm: Option<f64>,
    pub datetime: Option<NaiveDateTime>,
    #[serde(rename = "PM2.5_Category")]
    pub pm25_category: Option<Pm25Category>,
}

impl Record {
    /// Observation at the given hour with every measurement missing.
    pub fn new(year: i32, month: i32, day: i32, hour: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            pm25: None,
            pm10: None,
            so2: None,
            no2: None,
            co: None,
            o3: None,
            temp: None,
            pres: None,
            dewp: None,
            rain: None,
            wspm: None,
            datetime: None,
            pm25_category: None,
        }
    }

    /// Set a measurement by its CSV column name. Unknown names are ignored.
    pub fn with(mut self, column: &str, value: Option<f64>) -> Self {
        if let Some(slot) = self.measurement_mut(column) {
            *slot = value;
        }
        self
    }

    /// Measurement by CSV column name.
    pub fn measurement(&self, column: &str) -> Option<f64> {
        match column {
            "PM2.5" => self.pm25,
            "PM10" => self.pm10,
            "SO2" => self.so2,
            "NO2" => self.no2,
            "CO" => self.co,
            "O3" => self.o3,
            "TEMP" => self.temp,
            "PRES" => self.pres,
            "DEWP" => self.dewp,
            "RAIN" => self.rain,
            "WSPM" => self.wspm,
            _ => None,
        }
    }

    fn measurement_mut(&mut self, column: &str) -> Option<&mut Option<f64>> {
        let slot = match column {
            "PM2.5" => &mut self.pm25,
            "PM10" => &mut self.pm10,
            "SO2" => &mut self.so2,
            "NO2" => &mut self.no2,
            "CO" => &mut self.co,
            "O3" => &mut self.o3,
            "TEMP" => &mut self.temp,
            "PRES" => &mut self.pres,
            "DEWP" => &mut self.dewp,
            "RAIN" => &mut self.rain,
            "WSPM" => &mut self.wspm,
            _ => return None,
        };
        Some(slot)
    }
}

/// Ordered hourly observations for one station, backed by a Polars DataFrame.
#[derive(Debug, Clone)]
pub struct AirQualityDataset {
    df: DataFrame,
}

impl AirQualityDataset {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a dataset from typed records (date parts, measurements and any
    /// derived columns present on the records).
    pub fn from_records(records: &[Record]) -> Result<Self, DatasetError> {
        let mut columns = vec![
            Column::new("year".into(), records.iter().map(|r| r.year).collect::<Vec<i32>>()),
            Column::new("month".into(), records.iter().map(|r| r.month).collect::<Vec<i32>>()),
            Column::new("day".into(), records.iter().map(|r| r.day).collect::<Vec<i32>>()),
            Column::new("hour".into(), records.iter().map(|r| r.hour).collect::<Vec<i32>>()),
        ];

        for name in measurement_columns() {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.measurement(name)).collect();
            columns.push(Column::new(name.into(), values));
        }

        if !records.is_empty() && records.iter().all(|r| r.datetime.is_some()) {
            let stamps: Vec<NaiveDateTime> = records.iter().filter_map(|r| r.datetime).collect();
            columns.push(Column::new(DATETIME_COLUMN.into(), stamps));
        }

        if records.iter().any(|r| r.pm25_category.is_some()) {
            let labels: Vec<Option<&str>> = records
                .iter()
                .map(|r| r.pm25_category.map(|c| c.label()))
                .collect();
            columns.push(Column::new(CATEGORY_COLUMN.into(), labels));
        }

        Ok(Self::new(DataFrame::new(columns)?))
    }

    /// Get a reference to the underlying DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of records.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.df
            .column(name)
            .map_err(|_| DatasetError::MissingColumn(name.to_string()))
    }

    /// Float values of a column. Nulls and NaN both read as `None`.
    pub fn float_values(&self, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
        let values = self.column(name)?.cast(&DataType::Float64)?;
        let ca = values.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Integer values of a column.
    pub fn int_values(&self, name: &str) -> Result<Vec<Option<i32>>, DatasetError> {
        let values = self.column(name)?.cast(&DataType::Int32)?;
        let ca = values.i32()?;
        Ok(ca.into_iter().collect())
    }

    /// Text values of a column.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>, DatasetError> {
        let values = self.column(name)?.cast(&DataType::String)?;
        let ca = values.as_materialized_series().str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Add or replace a column in place.
    pub fn set_column(&mut self, column: Column) -> Result<(), DatasetError> {
        self.df.with_column(column)?;
        Ok(())
    }

    /// First `n` rows as typed records.
    pub fn head(&self, n: usize) -> Result<Vec<Record>, DatasetError> {
        AirQualityDataset::new(self.df.head(Some(n))).records()
    }

    /// All rows as typed records.
    pub fn records(&self) -> Result<Vec<Record>, DatasetError> {
        let years = self.int_values("year")?;
        let months = self.int_values("month")?;
        let days = self.int_values("day")?;
        let hours = self.int_values("hour")?;

        let measurements = measurement_columns()
            .map(|name| Ok((name, self.float_values(name)?)))
            .collect::<Result<Vec<_>, DatasetError>>()?;

        let categories = if self.has_column(CATEGORY_COLUMN) {
            Some(self.text_values(CATEGORY_COLUMN)?)
        } else {
            None
        };
        let with_datetime = self.has_column(DATETIME_COLUMN);

        let mut records = Vec::with_capacity(self.height());
        for i in 0..self.height() {
            let mut record = Record::new(
                years[i].unwrap_or_default(),
                months[i].unwrap_or_default(),
                days[i].unwrap_or_default(),
                hours[i].unwrap_or_default(),
            );
            for (name, values) in &measurements {
                if let Some(slot) = record.measurement_mut(name) {
                    *slot = values[i];
                }
            }
            if with_datetime {
                record.datetime =
                    compose_timestamp(record.year, record.month, record.day, record.hour);
            }
            record.pm25_category = categories
                .as_ref()
                .and_then(|labels| labels[i].as_deref())
                .and_then(Pm25Category::from_label);
            records.push(record);
        }

        Ok(records)
    }
}
