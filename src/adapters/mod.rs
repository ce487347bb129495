pub mod cache;
pub mod csv_source;
pub mod memory_store;
pub mod sqlite_store;
pub mod storage;
pub mod weather_api;

pub use cache::CachedDataSource;
pub use csv_source::{CsvDataSource, DataFiles};
pub use memory_store::InMemoryCareStore;
pub use sqlite_store::SqliteCareStore;
pub use storage::LocalStorage;
pub use weather_api::HttpWeatherSource;
