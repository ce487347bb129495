use crate::app::report::build_report_bundle;
use crate::core::anomaly::{detect_consumption_anomalies, detect_meal_pattern_anomalies};
use crate::core::correlation::{
    analyze_weather_correlation, interpret_correlation, weather_condition_impact,
};
use crate::core::isolation_forest::IsolationForest;
use crate::core::risk::{assess_all_residents, RiskPolicy};
use crate::core::summary::{health_summary, nutrition_report, resident_overview};
use crate::domain::model::CareDataset;
use crate::domain::ports::{
    CareDataSource, CareRepository, OutlierScorer, Pipeline, ReportSettings, Storage,
};
use crate::domain::report::{InsightReport, NutritionReport};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Loads the facility tables, runs every enabled analysis and writes the
/// report bundle.
pub struct InsightsPipeline<D, S, R, C>
where
    D: CareDataSource,
    S: Storage,
    R: CareRepository + Send + Sync,
    C: ReportSettings,
{
    source: D,
    storage: S,
    repository: R,
    settings: C,
    scorer: Box<dyn OutlierScorer + Send + Sync>,
    policy: RiskPolicy,
    reference_date: NaiveDate,
}

impl<D, S, R, C> InsightsPipeline<D, S, R, C>
where
    D: CareDataSource,
    S: Storage,
    R: CareRepository + Send + Sync,
    C: ReportSettings,
{
    pub fn new(source: D, storage: S, repository: R, settings: C, reference_date: NaiveDate) -> Self {
        Self {
            source,
            storage,
            repository,
            settings,
            scorer: Box::new(IsolationForest::default()),
            policy: RiskPolicy::default(),
            reference_date,
        }
    }

    pub fn with_scorer(mut self, scorer: impl OutlierScorer + Send + Sync + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_risk_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    fn enabled(&self, section: &str) -> bool {
        let enabled = self.settings.section_enabled(section);
        if !enabled {
            tracing::debug!("⏭️ Skipping section: {}", section);
        }
        enabled
    }
}

#[async_trait::async_trait]
impl<D, S, R, C> Pipeline for InsightsPipeline<D, S, R, C>
where
    D: CareDataSource,
    S: Storage,
    R: CareRepository + Send + Sync,
    C: ReportSettings,
{
    async fn extract(&self) -> Result<CareDataset> {
        self.source.load_dataset().await
    }

    async fn transform(&self, data: CareDataset) -> Result<InsightReport> {
        let overview = if self.enabled("overview") {
            resident_overview(&data.residents)
        } else {
            None
        };

        let nutrition = if self.enabled("nutrition") {
            nutrition_report(&data.meal_orders, &data.residents)
        } else {
            NutritionReport::default()
        };

        let health = if self.enabled("health") {
            health_summary(&data.health_records)
        } else {
            Vec::new()
        };

        let weather = if self.enabled("weather") {
            analyze_weather_correlation(&data.meal_orders, &data.weather)
        } else {
            None
        };
        let weather_conditions = weather
            .as_ref()
            .map(|w| weather_condition_impact(&w.joined))
            .unwrap_or_default();
        let correlation_notes = weather
            .as_ref()
            .map(|w| {
                w.correlations
                    .iter()
                    .map(|c| (c.meal_type.clone(), interpret_correlation(c)))
                    .filter(|(_, notes)| !notes.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let (resident_anomalies, meal_anomalies) = if self.enabled("anomalies") {
            (
                detect_consumption_anomalies(
                    &data.meal_orders,
                    &data.residents,
                    self.scorer.as_ref(),
                )?,
                detect_meal_pattern_anomalies(&data.meal_orders),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let risk_profiles = if self.enabled("risk") {
            assess_all_residents(&self.repository, self.reference_date, &self.policy)?
        } else {
            Vec::new()
        };

        Ok(InsightReport {
            facility: self.settings.facility_name().to_string(),
            reference_date: self.reference_date,
            overview,
            nutrition,
            health,
            weather,
            weather_conditions,
            correlation_notes,
            resident_anomalies,
            meal_anomalies,
            risk_profiles,
        })
    }

    async fn load(&self, report: InsightReport) -> Result<String> {
        let filename = self.settings.report_filename();
        let (zip_data, members) = build_report_bundle(&report, &self.settings)?;

        // 保存ZIP文件
        tracing::debug!(
            "Writing ZIP file ({} bytes, {} members) to storage",
            zip_data.len(),
            members.len()
        );
        self.storage.write_file(filename, &zip_data).await?;

        Ok(format!("{}/{}", self.settings.output_path(), filename))
    }
}
