pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{
    CachedDataSource, CsvDataSource, DataFiles, HttpWeatherSource, InMemoryCareStore,
    LocalStorage, SqliteCareStore,
};
pub use app::InsightsPipeline;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;
pub use crate::core::{InsightsEngine, IsolationForest, RiskPolicy};
pub use utils::error::{CareError, Result};
