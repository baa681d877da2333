//! Air Quality Dashboard - analysis core
//!
//! Loads the hourly Guanyuan station CSV, median-fills gaps, and computes the
//! monthly PM2.5/temperature trend, a weather correlation matrix and the
//! PM2.5 health-category distribution for a presentation layer.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod stats;

pub use config::DashboardConfig;
pub use dashboard::{DashboardData, JsonPresenter, Presenter};
pub use data::{AirQualityDataset, DataLoader, DataProcessor, DatasetCache, Record};
pub use error::DashboardError;
pub use stats::{CategoryCount, Classifier, CorrelationMatrix, Pm25Category, StatsCalculator, TrendPoint};
