//! Dashboard Configuration Module
//! Fixed dataset location and view settings.

use std::path::{Path, PathBuf};

/// File name of the Guanyuan station dataset.
pub const DATASET_FILE_NAME: &str = "PRSA_Data_Guanyuan_20130301-20170228.csv";

/// Number of processed rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 5;

/// Columns compared in the correlation heatmap.
pub const CORRELATION_COLUMNS: [&str; 5] = ["PM2.5", "PM10", "TEMP", "RAIN", "WSPM"];

/// Default dataset path, anchored to the crate directory rather than the
/// working directory of the process.
pub fn default_dataset_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(DATASET_FILE_NAME)
}

/// Settings for one dashboard build.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    pub preview_rows: usize,
    pub correlation_columns: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            preview_rows: PREVIEW_ROWS,
            correlation_columns: CORRELATION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}
