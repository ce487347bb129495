pub mod pipelines;
pub mod report;

pub use pipelines::InsightsPipeline;
pub use report::{build_report_bundle, ReportBundle};
