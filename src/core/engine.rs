use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct InsightsEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> InsightsEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 依序執行 extract → transform → load，回傳報表位置
    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting care insights run");
        self.monitor.log_stats("start");

        // Extract
        tracing::info!("📥 Loading facility data...");
        let dataset = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Loaded {} residents, {} meal orders, {} weather days, {} health records",
            dataset.residents.len(),
            dataset.meal_orders.len(),
            dataset.weather.len(),
            dataset.health_records.len()
        );
        self.monitor.log_stats("extract");

        // Transform
        tracing::info!("🔄 Running analyses...");
        let report = self.pipeline.transform(dataset).await?;
        tracing::info!(
            "🔄 Flagged {} resident anomalies, {} meal anomalies, assessed {} residents",
            report
                .resident_anomalies
                .iter()
                .filter(|r| r.is_anomaly)
                .count(),
            report.meal_anomalies.iter().filter(|r| r.is_anomaly).count(),
            report.risk_profiles.len()
        );
        self.monitor.log_stats("transform");

        // Load
        tracing::info!("💾 Writing report...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("💾 Report saved to: {}", output_path);
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CareDataset;
    use crate::domain::report::{InsightReport, NutritionReport};
    use crate::utils::error::CareError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// 記錄各階段呼叫順序
    #[derive(Default)]
    struct RecordingPipeline {
        calls: Mutex<Vec<&'static str>>,
        fail_transform: bool,
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<CareDataset> {
            self.calls.lock().unwrap().push("extract");
            Ok(CareDataset::default())
        }

        async fn transform(&self, _data: CareDataset) -> Result<InsightReport> {
            self.calls.lock().unwrap().push("transform");
            if self.fail_transform {
                return Err(CareError::processing("boom"));
            }
            Ok(InsightReport {
                facility: "Test".to_string(),
                reference_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                overview: None,
                nutrition: NutritionReport::default(),
                health: Vec::new(),
                weather: None,
                weather_conditions: Vec::new(),
                correlation_notes: Vec::new(),
                resident_anomalies: Vec::new(),
                meal_anomalies: Vec::new(),
                risk_profiles: Vec::new(),
            })
        }

        async fn load(&self, _report: InsightReport) -> Result<String> {
            self.calls.lock().unwrap().push("load");
            Ok("out/report.zip".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_executes_phases_in_order() {
        let engine = InsightsEngine::new(RecordingPipeline::default());
        let path = engine.run().await.unwrap();

        assert_eq!(path, "out/report.zip");
        assert_eq!(
            *engine.pipeline().calls.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_failed_transform_stops_before_load() {
        let engine = InsightsEngine::new_with_monitoring(
            RecordingPipeline {
                fail_transform: true,
                ..Default::default()
            },
            false,
        );

        assert!(engine.run().await.is_err());
        assert_eq!(
            *engine.pipeline().calls.lock().unwrap(),
            vec!["extract", "transform"]
        );
    }
}
