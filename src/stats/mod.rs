//! Stats module - Aggregation, correlation and PM2.5 classification

mod calculator;
mod classifier;

pub use calculator::{CorrelationMatrix, StatsCalculator, StatsError, TrendPoint};
pub use classifier::{categorize_pm25, CategoryCount, Classifier, Pm25Category, PM25_BREAKPOINTS};
