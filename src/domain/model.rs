use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type ResidentId = i64;

/// 餐別。無法辨識的值保留原字串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
    Other(String),
}

impl MealType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" | "frühstück" | "fruehstueck" => MealType::Breakfast,
            "lunch" | "mittagessen" => MealType::Lunch,
            "dinner" | "abendessen" => MealType::Dinner,
            "dessert" | "nachspeise" | "nachtisch" => MealType::Dessert,
            _ => MealType::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Dessert => "dessert",
            MealType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MealType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MealType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(MealType::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealOrder {
    pub resident_id: ResidentId,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub actual_consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub resident_id: ResidentId,
    pub age: u32,
    pub care_level: u8,
    #[serde(default)]
    pub special_dietary_requirements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub temperature: f64,
    pub precipitation: f64,
    pub humidity: f64,
    #[serde(default)]
    pub weather_condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub resident_id: ResidentId,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub blood_pressure_systolic: f64,
    pub heart_rate: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityParticipation {
    pub resident_id: ResidentId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outing {
    pub resident_id: ResidentId,
    pub departure_time: NaiveDateTime,
}

/// 風險評估使用的照護資料檢視
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentCare {
    pub resident_id: ResidentId,
    pub mobility_status: Option<String>,
    pub last_fall_date: Option<NaiveDate>,
}

/// 一次分析所需的全部表格資料
#[derive(Debug, Clone, Default, Serialize)]
pub struct CareDataset {
    pub residents: Vec<Resident>,
    pub meal_orders: Vec<MealOrder>,
    pub weather: Vec<WeatherObservation>,
    pub health_records: Vec<HealthRecord>,
}

/// 風險分數 (0-100) 與觸發的因素說明
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub factors: Vec<String>,
}

/// 解析日期字串，捨棄時間部分
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }
}
