//! Dashboard Payload Module
//! Bundles the four views handed to the presentation layer.

use crate::config::DashboardConfig;
use crate::data::{AirQualityDataset, Record};
use crate::error::DashboardError;
use crate::stats::{CategoryCount, Classifier, CorrelationMatrix, StatsCalculator, TrendPoint};
use serde::Serialize;
use std::io::Write;

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    /// First rows of the processed dataset, category included.
    pub preview: Vec<Record>,
    pub trend: Vec<TrendPoint>,
    pub correlation: CorrelationMatrix,
    pub categories: CategoryCount,
    pub record_count: usize,
}

impl DashboardData {
    /// Build every view from a cleaned dataset. The cached dataset is left
    /// untouched; classification works on a cheap clone.
    pub fn build(
        dataset: &AirQualityDataset,
        config: &DashboardConfig,
    ) -> Result<Self, DashboardError> {
        let trend = StatsCalculator::monthly_trend(dataset)?;
        let correlation = StatsCalculator::correlation_matrix(dataset, &config.correlation_columns)?;

        let mut classified = dataset.clone();
        let categories = Classifier::categorize_distribution(&mut classified)?;
        let preview = classified.head(config.preview_rows)?;

        log::info!(
            "Dashboard ready: {} records, {} monthly points",
            dataset.height(),
            trend.len()
        );

        Ok(Self {
            preview,
            trend,
            correlation,
            categories,
            record_count: dataset.height(),
        })
    }
}

/// Presentation boundary: accepts the built views and shows them.
pub trait Presenter {
    fn render(&mut self, data: &DashboardData) -> anyhow::Result<()>;
}

/// Writes the payload as pretty-printed JSON for an external front end.
pub struct JsonPresenter<W: Write> {
    writer: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn render(&mut self, data: &DashboardData) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, data)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
