// Domain layer: records, analysis results and ports. No storage or HTTP code lives here.

pub mod model;
pub mod ports;
pub mod report;
