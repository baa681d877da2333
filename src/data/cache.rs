//! Dataset Cache Module
//! Process-lifetime memoization of the cleaned dataset.

use super::model::AirQualityDataset;
use super::{DataLoader, DataProcessor};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Loads and preprocesses the dataset once, then hands out the same copy.
///
/// The source file is static for the life of the process, so there is no
/// eviction. A failed load is not remembered and will be retried on the
/// next call.
pub struct DatasetCache {
    source: PathBuf,
    dataset: OnceLock<AirQualityDataset>,
}

impl DatasetCache {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dataset: OnceLock::new(),
        }
    }

    /// Cache bound to the bundled station file.
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(|| DatasetCache::new(DashboardConfig::default().dataset_path))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    /// Return the cleaned dataset, loading it on first use.
    pub fn get_or_load(&self) -> Result<&AirQualityDataset, DashboardError> {
        if let Some(dataset) = self.dataset.get() {
            log::debug!("Dataset cache hit for {}", self.source.display());
            return Ok(dataset);
        }

        let mut dataset = DataLoader::load_csv(&self.source)?;
        DataProcessor::preprocess(&mut dataset)?;
        Ok(self.dataset.get_or_init(|| dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_dataset_path;
    use crate::data::LoaderError;

    #[test]
    fn failed_load_is_not_cached() {
        let cache = DatasetCache::new("no/such/station.csv");

        assert!(matches!(
            cache.get_or_load(),
            Err(DashboardError::Load(LoaderError::FileNotFound(_)))
        ));
        assert!(!cache.is_loaded());
        assert!(cache.get_or_load().is_err());
    }

    #[test]
    fn global_cache_points_at_bundled_file() {
        let cache = DatasetCache::global();
        assert!(std::ptr::eq(cache, DatasetCache::global()));
        assert_eq!(cache.source(), default_dataset_path().as_path());
    }
}
