use crate::domain::model::{calendar_date, MealType};
use crate::domain::ports::ReportSettings;
use crate::domain::report::InsightReport;
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// ZIP 報表的建構器，記錄已加入的成員
pub struct ReportBundle {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    members: Vec<String>,
}

impl Default for ReportBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBundle {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            members: Vec::new(),
        }
    }

    /// 以 serde 欄位名稱為表頭寫入 CSV；`None` 輸出為空白欄位
    pub fn add_csv<T: Serialize>(&mut self, name: &str, rows: &[T]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        self.add_bytes(name, &data)
    }

    pub fn add_json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        self.add_bytes(name, data.as_bytes())
    }

    fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip.start_file(name, SimpleFileOptions::default())?;
        self.zip.write_all(data)?;
        self.members.push(name.to_string());
        Ok(())
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// 完成並取回底層 Vec<u8>
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[derive(Serialize)]
struct OverviewRow {
    resident_count: usize,
    mean_age: f64,
    min_age: u32,
    max_age: u32,
    mean_care_level: f64,
}

#[derive(Serialize)]
struct AgeCount {
    age: u32,
    residents: usize,
}

#[derive(Serialize)]
struct ReportCounts {
    residents_assessed: usize,
    resident_anomalies: usize,
    meal_anomalies: usize,
    weather_days_joined: usize,
}

#[derive(Serialize)]
struct CorrelationNote<'a> {
    meal_type: &'a MealType,
    notes: &'a [String],
}

#[derive(Serialize)]
struct ReportMetadata<'a> {
    facility: &'a str,
    #[serde(with = "calendar_date")]
    reference_date: NaiveDate,
    sections: Vec<&'static str>,
    members: &'a [String],
    counts: ReportCounts,
    weather_data_available: bool,
    correlation_notes: Vec<CorrelationNote<'a>>,
}

/// Writes every enabled section of `report` into one ZIP archive.
///
/// `report.json` is always written last and lists the other members.
pub fn build_report_bundle<C: ReportSettings + ?Sized>(
    report: &InsightReport,
    settings: &C,
) -> Result<(Vec<u8>, Vec<String>)> {
    let mut bundle = ReportBundle::new();

    if settings.section_enabled("overview") {
        if let Some(overview) = &report.overview {
            bundle.add_csv(
                "overview.csv",
                &[OverviewRow {
                    resident_count: overview.resident_count,
                    mean_age: overview.mean_age,
                    min_age: overview.min_age,
                    max_age: overview.max_age,
                    mean_care_level: overview.mean_care_level,
                }],
            )?;
            let ages: Vec<AgeCount> = overview
                .age_distribution
                .iter()
                .map(|(age, residents)| AgeCount {
                    age: *age,
                    residents: *residents,
                })
                .collect();
            bundle.add_csv("age_distribution.csv", &ages)?;
        }
    }

    if settings.section_enabled("nutrition") {
        let nutrition = &report.nutrition;
        bundle.add_csv("nutrition_consumption.csv", &nutrition.by_meal_type)?;
        bundle.add_csv("nutrition_waste.csv", &nutrition.waste_by_meal_type)?;
        bundle.add_csv("care_level_consumption.csv", &nutrition.by_care_level)?;
        bundle.add_csv("daily_waste.csv", &nutrition.daily_waste)?;
    }

    if settings.section_enabled("health") {
        bundle.add_csv("health_summary.csv", &report.health)?;
    }

    if settings.section_enabled("weather") {
        match &report.weather {
            Some(weather) => {
                bundle.add_csv("weather_consumption.csv", &weather.joined)?;
                bundle.add_csv("weather_correlations.csv", &weather.correlations)?;
                bundle.add_csv("weather_conditions.csv", &report.weather_conditions)?;
            }
            None => tracing::warn!("No matching weather data, skipping weather files"),
        }
    }

    if settings.section_enabled("anomalies") {
        bundle.add_csv("resident_anomalies.csv", &report.resident_anomalies)?;
        bundle.add_csv("meal_anomalies.csv", &report.meal_anomalies)?;
    }

    if settings.section_enabled("risk") {
        bundle.add_json("risk_assessments.json", &report.risk_profiles)?;
    }

    let mut members = bundle.members().to_vec();
    members.push("report.json".to_string());

    let metadata = ReportMetadata {
        facility: &report.facility,
        reference_date: report.reference_date,
        sections: crate::domain::report::REPORT_SECTIONS
            .into_iter()
            .filter(|s| settings.section_enabled(s))
            .collect(),
        members: &members,
        counts: ReportCounts {
            residents_assessed: report.risk_profiles.len(),
            resident_anomalies: report
                .resident_anomalies
                .iter()
                .filter(|r| r.is_anomaly)
                .count(),
            meal_anomalies: report.meal_anomalies.iter().filter(|r| r.is_anomaly).count(),
            weather_days_joined: report
                .weather
                .as_ref()
                .map(|w| {
                    let mut dates: Vec<NaiveDate> = w.joined.iter().map(|row| row.date).collect();
                    dates.dedup();
                    dates.len()
                })
                .unwrap_or(0),
        },
        weather_data_available: report.weather.is_some(),
        correlation_notes: report
            .correlation_notes
            .iter()
            .map(|(meal_type, notes)| CorrelationNote { meal_type, notes })
            .collect(),
    };
    bundle.add_json("report.json", &metadata)?;

    tracing::debug!("Creating ZIP file with {} files", members.len());
    Ok((bundle.finish()?, members))
}
