use crate::domain::model::{calendar_date, MealType, ResidentId, RiskAssessment};
use chrono::NaiveDate;
use serde::Serialize;

/// 報表可開關的區段
pub const REPORT_SECTIONS: [&str; 6] = [
    "overview",
    "nutrition",
    "health",
    "weather",
    "anomalies",
    "risk",
];

/// 每日每餐別平均食用率與當日天氣
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherConsumption {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub actual_consumption: f64,
    pub temperature: f64,
    pub precipitation: f64,
    pub humidity: f64,
    pub weather_condition: String,
}

/// `None` 表示相關係數無定義 (變異數為零)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealCorrelation {
    pub meal_type: MealType,
    pub observations: usize,
    pub temperature_correlation: Option<f64>,
    pub precipitation_correlation: Option<f64>,
    pub humidity_correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherCorrelationReport {
    pub joined: Vec<WeatherConsumption>,
    pub correlations: Vec<MealCorrelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentConsumptionAnomaly {
    pub resident_id: ResidentId,
    pub mean_consumption: f64,
    pub std_consumption: f64,
    pub meal_count: usize,
    pub is_anomaly: bool,
    pub age: u32,
    pub care_level: u8,
    pub special_dietary_requirements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPatternAnomaly {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub actual_consumption: f64,
    pub mean_consumption: f64,
    pub std_consumption: Option<f64>,
    pub z_score: Option<f64>,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTypeConsumption {
    pub meal_type: MealType,
    pub mean_consumption: f64,
    pub std_consumption: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTypeWaste {
    pub meal_type: MealType,
    pub mean_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyWaste {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub mean_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareLevelConsumption {
    pub care_level: u8,
    pub mean_consumption: f64,
    pub mean_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyHealthSummary {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub systolic_mean: f64,
    pub systolic_std: Option<f64>,
    pub heart_rate_mean: f64,
    pub heart_rate_std: Option<f64>,
    pub weight_mean: f64,
    pub weight_std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentOverview {
    pub resident_count: usize,
    pub mean_age: f64,
    pub min_age: u32,
    pub max_age: u32,
    pub mean_care_level: f64,
    pub age_distribution: Vec<(u32, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherConditionImpact {
    pub weather_condition: String,
    pub mean_consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentRiskProfile {
    pub resident_id: ResidentId,
    pub social_isolation: RiskAssessment,
    pub fall: RiskAssessment,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NutritionReport {
    pub by_meal_type: Vec<MealTypeConsumption>,
    pub waste_by_meal_type: Vec<MealTypeWaste>,
    pub by_care_level: Vec<CareLevelConsumption>,
    pub daily_waste: Vec<DailyWaste>,
}

/// transform 階段的完整輸出
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub facility: String,
    #[serde(with = "calendar_date")]
    pub reference_date: NaiveDate,
    pub overview: Option<ResidentOverview>,
    pub nutrition: NutritionReport,
    pub health: Vec<DailyHealthSummary>,
    pub weather: Option<WeatherCorrelationReport>,
    pub weather_conditions: Vec<WeatherConditionImpact>,
    pub correlation_notes: Vec<(MealType, Vec<String>)>,
    pub resident_anomalies: Vec<ResidentConsumptionAnomaly>,
    pub meal_anomalies: Vec<MealPatternAnomaly>,
    pub risk_profiles: Vec<ResidentRiskProfile>,
}
