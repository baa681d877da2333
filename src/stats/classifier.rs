//! PM2.5 Classifier Module
//! Maps PM2.5 concentrations to health categories and tallies them.

use super::calculator::StatsError;
use crate::data::{AirQualityDataset, CATEGORY_COLUMN, PM25_COLUMN};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Health category of a PM2.5 reading (µg/m³), ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Pm25Category {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

/// Inclusive upper bound of each bracket, scanned in order. Anything above
/// the last bound is Hazardous.
pub const PM25_BREAKPOINTS: [(f64, Pm25Category); 5] = [
    (12.0, Pm25Category::Good),
    (35.4, Pm25Category::Moderate),
    (55.4, Pm25Category::UnhealthyForSensitiveGroups),
    (150.4, Pm25Category::Unhealthy),
    (250.4, Pm25Category::VeryUnhealthy),
];

impl Pm25Category {
    pub const ALL: [Pm25Category; 6] = [
        Pm25Category::Good,
        Pm25Category::Moderate,
        Pm25Category::UnhealthyForSensitiveGroups,
        Pm25Category::Unhealthy,
        Pm25Category::VeryUnhealthy,
        Pm25Category::Hazardous,
    ];

    /// Classify one reading. `NaN` compares false against every bound and
    /// ends up Hazardous.
    pub fn from_value(value: f64) -> Self {
        PM25_BREAKPOINTS
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map(|(_, category)| *category)
            .unwrap_or(Pm25Category::Hazardous)
    }

    pub fn label(self) -> &'static str {
        match self {
            Pm25Category::Good => "Good",
            Pm25Category::Moderate => "Moderate",
            Pm25Category::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Pm25Category::Unhealthy => "Unhealthy",
            Pm25Category::VeryUnhealthy => "Very Unhealthy",
            Pm25Category::Hazardous => "Hazardous",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Pm25Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a single PM2.5 value.
pub fn categorize_pm25(value: f64) -> Pm25Category {
    Pm25Category::from_value(value)
}

/// Number of records per category. Every category is present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCount {
    counts: BTreeMap<Pm25Category, usize>,
}

impl Default for CategoryCount {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryCount {
    pub fn new() -> Self {
        Self {
            counts: Pm25Category::ALL.iter().map(|c| (*c, 0)).collect(),
        }
    }

    pub fn record(&mut self, category: Pm25Category) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn get(&self, category: Pm25Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Counts in ladder order, Good first.
    pub fn iter(&self) -> impl Iterator<Item = (Pm25Category, usize)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Observed categories only, most frequent first (ties in ladder order).
    pub fn sorted_by_count(&self) -> Vec<(Pm25Category, usize)> {
        let mut observed: Vec<(Pm25Category, usize)> = self.iter().filter(|(_, n)| *n > 0).collect();
        observed.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        observed
    }
}

impl FromIterator<Pm25Category> for CategoryCount {
    fn from_iter<I: IntoIterator<Item = Pm25Category>>(iter: I) -> Self {
        let mut count = CategoryCount::new();
        for category in iter {
            count.record(category);
        }
        count
    }
}

/// Applies the PM2.5 ladder to a whole dataset.
pub struct Classifier;

impl Classifier {
    /// Classify every record, add the `PM2.5_Category` column and return the
    /// tally. The dataset must already be preprocessed.
    pub fn categorize_distribution(
        dataset: &mut AirQualityDataset,
    ) -> Result<CategoryCount, StatsError> {
        let values = dataset.float_values(PM25_COLUMN)?;

        let categories = values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(Pm25Category::from_value)
                    .ok_or_else(|| StatsError::MissingValue {
                        column: PM25_COLUMN.to_string(),
                        row,
                    })
            })
            .collect::<Result<Vec<_>, StatsError>>()?;

        let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
        dataset.set_column(Column::new(CATEGORY_COLUMN.into(), labels))?;

        let count: CategoryCount = categories.into_iter().collect();
        log::info!(
            "Classified {} records: {}",
            count.total(),
            count
                .iter()
                .map(|(c, n)| format!("{c}={n}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(count)
    }
}
