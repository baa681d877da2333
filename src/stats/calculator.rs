//! Statistics Calculator Module
//! Handles medians, monthly trend aggregation and Pearson correlation.

use crate::data::{AirQualityDataset, DatasetError, PM25_COLUMN, TEMP_COLUMN};
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("{year}-{month} is not a valid month")]
    InvalidMonth { year: i32, month: i32 },
    #[error("Column '{column}' is missing a value at row {row}; preprocess the dataset first")]
    MissingValue { column: String, row: usize },
}

/// Monthly mean of PM2.5 and temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub month: i32,
    /// First day of the month, used as the x position.
    pub date: NaiveDate,
    #[serde(rename = "PM2.5")]
    pub pm25: f64,
    #[serde(rename = "TEMP")]
    pub temp: f64,
    pub count: usize,
}

/// Pairwise Pearson coefficients between a fixed list of columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

#[derive(Default)]
struct MonthAccumulator {
    pm25_sum: f64,
    pm25_count: usize,
    temp_sum: f64,
    temp_count: usize,
    count: usize,
}

/// Handles statistical calculations over the cleaned dataset.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Median of the given values, `None` when empty.
    pub fn median(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Some(median)
    }

    /// Pearson correlation of two equally long samples.
    ///
    /// `NaN` when either side has no variance or fewer than two points.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.len() < 2 {
            return f64::NAN;
        }

        let sx = x.iter().std_dev();
        let sy = y.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }

        x.iter().covariance(y.iter()) / (sx * sy)
    }

    /// Group records by (year, month) and average PM2.5 and TEMP per group.
    ///
    /// Points come back in ascending (year, month) order.
    pub fn monthly_trend(dataset: &AirQualityDataset) -> Result<Vec<TrendPoint>, StatsError> {
        let years = dataset.int_values("year")?;
        let months = dataset.int_values("month")?;
        let pm25 = dataset.float_values(PM25_COLUMN)?;
        let temp = dataset.float_values(TEMP_COLUMN)?;

        let mut groups: BTreeMap<(i32, i32), MonthAccumulator> = BTreeMap::new();
        for i in 0..dataset.height() {
            let key = (years[i].unwrap_or_default(), months[i].unwrap_or_default());
            let acc = groups.entry(key).or_default();
            acc.count += 1;
            if let Some(v) = pm25[i] {
                acc.pm25_sum += v;
                acc.pm25_count += 1;
            }
            if let Some(v) = temp[i] {
                acc.temp_sum += v;
                acc.temp_count += 1;
            }
        }

        groups
            .into_iter()
            .map(|((year, month), acc)| {
                let date = u32::try_from(month)
                    .ok()
                    .and_then(|m| NaiveDate::from_ymd_opt(year, m, 1))
                    .ok_or(StatsError::InvalidMonth { year, month })?;

                Ok(TrendPoint {
                    year,
                    month,
                    date,
                    pm25: mean_of(acc.pm25_sum, acc.pm25_count),
                    temp: mean_of(acc.temp_sum, acc.temp_count),
                    count: acc.count,
                })
            })
            .collect()
    }

    /// Pearson correlation matrix over the named columns.
    ///
    /// Each pair uses the rows where both values are present.
    pub fn correlation_matrix(
        dataset: &AirQualityDataset,
        columns: &[String],
    ) -> Result<CorrelationMatrix, StatsError> {
        let series = columns
            .iter()
            .map(|name| dataset.float_values(name))
            .collect::<Result<Vec<_>, DatasetError>>()?;

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let (x, y): (Vec<f64>, Vec<f64>) = series[i]
                    .iter()
                    .zip(&series[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .unzip();

                let r = if i == j {
                    // exact 1 on the diagonal whenever the column varies
                    if Self::pearson(&x, &y).is_nan() {
                        f64::NAN
                    } else {
                        1.0
                    }
                } else {
                    Self::pearson(&x, &y)
                };

                if r.is_nan() {
                    log::warn!(
                        "Correlation between {} and {} is undefined",
                        columns[i],
                        columns[j]
                    );
                }
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            columns: columns.to_vec(),
            values,
        })
    }
}

fn mean_of(sum: f64, count: usize) -> f64 {
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn obs(year: i32, month: i32, day: i32, pm25: f64, temp: f64) -> Record {
        Record::new(year, month, day, 0)
            .with("PM2.5", Some(pm25))
            .with("TEMP", Some(temp))
    }

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(StatsCalculator::median(&[]), None);
        assert_eq!(StatsCalculator::median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(StatsCalculator::median(&[40.0, 10.0]), Some(25.0));
    }

    #[test]
    fn pearson_matches_hand_computation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((StatsCalculator::pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((StatsCalculator::pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);

        // r = 0.8 for this classic pair
        let r = StatsCalculator::pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]);
        assert!((r - 0.8).abs() < 1e-12);

        assert!(StatsCalculator::pearson(&x, &[5.0; 4]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn one_trend_point_per_month_in_order() {
        let dataset = AirQualityDataset::from_records(&[
            obs(2014, 1, 2, 100.0, -5.0),
            obs(2013, 12, 1, 10.0, 1.0),
            obs(2014, 1, 1, 50.0, -3.0),
            obs(2013, 12, 2, 30.0, 3.0),
            obs(2013, 3, 1, 7.0, 9.5),
        ])
        .unwrap();

        let trend = StatsCalculator::monthly_trend(&dataset).unwrap();

        let keys: Vec<(i32, i32)> = trend.iter().map(|p| (p.year, p.month)).collect();
        assert_eq!(keys, vec![(2013, 3), (2013, 12), (2014, 1)]);

        assert_eq!(trend[1].pm25, 20.0);
        assert_eq!(trend[1].temp, 2.0);
        assert_eq!(trend[1].count, 2);
        assert_eq!(trend[2].pm25, 75.0);
        assert_eq!(trend[2].temp, -4.0);
        assert_eq!(trend[2].date, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
    }

    #[test]
    fn trend_means_match_independent_computation() {
        let records: Vec<Record> = (0..60)
            .map(|i| obs(2015, 1 + (i % 3), 1 + i / 3, (i * 7 % 23) as f64 + 0.5, i as f64 / 10.0))
            .collect();
        let dataset = AirQualityDataset::from_records(&records).unwrap();

        let trend = StatsCalculator::monthly_trend(&dataset).unwrap();
        assert_eq!(trend.len(), 3);

        for point in &trend {
            let group: Vec<f64> = records
                .iter()
                .filter(|r| r.year == point.year && r.month == point.month)
                .filter_map(|r| r.pm25)
                .collect();
            let expected = group.iter().sum::<f64>() / group.len() as f64;
            assert!((point.pm25 - expected).abs() < 1e-9);
            assert_eq!(point.count, group.len());
        }
    }

    #[test]
    fn invalid_month_is_rejected() {
        let dataset = AirQualityDataset::from_records(&[obs(2014, 13, 1, 1.0, 1.0)]).unwrap();
        assert!(matches!(
            StatsCalculator::monthly_trend(&dataset),
            Err(StatsError::InvalidMonth { year: 2014, month: 13 })
        ));
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let dataset = AirQualityDataset::from_records(&[
            obs(2013, 3, 1, 10.0, 4.0).with("PM10", Some(20.0)).with("RAIN", Some(0.0)),
            obs(2013, 3, 2, 20.0, 3.0).with("PM10", Some(41.0)).with("RAIN", Some(0.0)),
            obs(2013, 3, 3, 30.0, 2.0).with("PM10", Some(59.0)).with("RAIN", Some(0.0)),
            obs(2013, 3, 4, 40.0, 1.0).with("PM10", Some(80.0)).with("RAIN", Some(0.0)),
        ])
        .unwrap();
        let columns: Vec<String> = ["PM2.5", "PM10", "TEMP", "RAIN"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let matrix = StatsCalculator::correlation_matrix(&dataset, &columns).unwrap();

        assert_eq!(matrix.get("PM2.5", "PM2.5"), Some(1.0));
        assert!((matrix.get("PM2.5", "TEMP").unwrap() + 1.0).abs() < 1e-12);
        assert!(matrix.get("PM2.5", "PM10").unwrap() > 0.99);
        assert_eq!(matrix.get("PM10", "PM2.5"), matrix.get("PM2.5", "PM10"));
        // constant column has no defined correlation
        assert!(matrix.get("RAIN", "RAIN").unwrap().is_nan());
        assert!(matrix.get("RAIN", "TEMP").unwrap().is_nan());
        assert_eq!(matrix.get("PM2.5", "CO"), None);
    }
}
