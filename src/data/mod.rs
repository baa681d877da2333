//! Data module - CSV loading, cleaning and caching

mod cache;
mod loader;
mod model;
mod processor;

pub use cache::DatasetCache;
pub use loader::{DataLoader, LoaderError};
pub use model::{
    compose_timestamp, measurement_columns, AirQualityDataset, DatasetError, Record,
    CATEGORY_COLUMN, DATETIME_COLUMN, DATE_COLUMNS, PM25_COLUMN, POLLUTANT_COLUMNS, TEMP_COLUMN,
    WEATHER_COLUMNS,
};
pub use processor::{ColumnFill, DataProcessor, ProcessorError};
