//! Startup error taxonomy.

use crate::data::{DatasetError, LoaderError, ProcessorError};
use crate::stats::StatsError;
use thiserror::Error;

/// Any failure that stops the dashboard from starting. None are retried.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Loading dataset failed: {0}")]
    Load(#[from] LoaderError),
    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] ProcessorError),
    #[error("Analysis failed: {0}")]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
