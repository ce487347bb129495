pub mod anomaly;
pub mod correlation;
pub mod engine;
pub mod isolation_forest;
pub mod risk;
pub mod stats;
pub mod summary;

pub use crate::domain::ports::{CareDataSource, CareRepository, OutlierScorer, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::InsightsEngine;
pub use isolation_forest::IsolationForest;
pub use risk::RiskPolicy;
