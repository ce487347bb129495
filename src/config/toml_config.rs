use crate::adapters::csv_source::DataFiles;
use crate::adapters::weather_api::HttpWeatherSource;
use crate::core::isolation_forest::{
    IsolationForest, DEFAULT_CONTAMINATION, DEFAULT_MAX_SAMPLES, DEFAULT_SEED, DEFAULT_TREES,
};
use crate::core::risk::{default_holidays, default_restricted_mobility, Holiday, RiskPolicy};
use crate::domain::ports::ReportSettings;
use crate::domain::report::REPORT_SECTIONS;
use crate::utils::error::{CareError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REPORT_FILENAME: &str = "care_insights_report.zip";
pub const DEFAULT_WEATHER_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub facility: FacilityConfig,
    pub data: DataConfig,
    pub weather_api: Option<WeatherApiConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    pub report: ReportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub base_path: String,
    pub residents: Option<String>,
    pub meal_orders: Option<String>,
    pub weather: Option<String>,
    pub health: Option<String>,
    /// SQLite 資料庫；相對路徑以 base_path 為準
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub contamination: f64,
    pub seed: u64,
    pub trees: usize,
    pub max_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
            trees: DEFAULT_TREES,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    pub restricted_mobility: Option<Vec<String>>,
    pub holidays: Option<Vec<Holiday>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| CareError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WEATHER_API_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CareError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("facility.name", &self.facility.name)?;

        // 資料來源
        validation::validate_path("data.base_path", &self.data.base_path)?;
        validation::validate_path("data.database", &self.data.database)?;
        let files = self.data_files();
        validation::validate_file_extensions(
            "data",
            &[
                files.residents.as_str(),
                files.meal_orders.as_str(),
                files.weather.as_str(),
                files.health_records.as_str(),
            ],
            &["csv"],
        )?;

        if let Some(api) = &self.weather_api {
            let endpoint = validation::validate_required_field("weather_api.endpoint", &api.endpoint)?;
            validation::validate_url("weather_api.endpoint", endpoint)?;
            if let Some(timeout) = api.timeout_seconds {
                validation::validate_positive_number(
                    "weather_api.timeout_seconds",
                    usize::try_from(timeout).unwrap_or(usize::MAX),
                    1,
                )?;
            }
        }

        // 分析參數
        validation::validate_range_exclusive_min(
            "analysis.contamination",
            self.analysis.contamination,
            0.0,
            0.5,
        )?;
        validation::validate_positive_number("analysis.trees", self.analysis.trees, 1)?;
        validation::validate_positive_number("analysis.max_samples", self.analysis.max_samples, 2)?;

        // 風險表
        if let Some(holidays) = &self.risk.holidays {
            for holiday in holidays {
                validation::validate_month_day("risk.holidays", &holiday.date)?;
                validation::validate_non_empty_string("risk.holidays.name", &holiday.name)?;
            }
        }
        if let Some(statuses) = &self.risk.restricted_mobility {
            for status in statuses {
                validation::validate_non_empty_string("risk.restricted_mobility", status)?;
            }
        }

        // 輸出
        validation::validate_path("report.output_path", &self.report.output_path)?;
        validation::validate_file_extensions(
            "report.filename",
            &[self.report_filename()],
            &["zip"],
        )?;
        if let Some(sections) = &self.report.sections {
            for section in sections {
                if !REPORT_SECTIONS.contains(&section.as_str()) {
                    return Err(CareError::InvalidConfigValueError {
                        field: "report.sections".to_string(),
                        value: section.clone(),
                        reason: format!(
                            "Unsupported section. Valid sections: {}",
                            REPORT_SECTIONS.join(", ")
                        ),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn data_files(&self) -> DataFiles {
        let defaults = DataFiles::default();
        DataFiles {
            residents: self.data.residents.clone().unwrap_or(defaults.residents),
            meal_orders: self.data.meal_orders.clone().unwrap_or(defaults.meal_orders),
            weather: self.data.weather.clone().unwrap_or(defaults.weather),
            health_records: self.data.health.clone().unwrap_or(defaults.health_records),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.data.base_path).join(&self.data.database)
    }

    /// 設定了 weather_api 時改由 HTTP 取得天氣資料
    pub fn weather_source(&self) -> Result<Option<HttpWeatherSource>> {
        self.weather_api
            .as_ref()
            .map(|api| {
                let endpoint =
                    validation::validate_required_field("weather_api.endpoint", &api.endpoint)?;
                let timeout = api
                    .timeout_seconds
                    .unwrap_or(DEFAULT_WEATHER_TIMEOUT_SECONDS);
                HttpWeatherSource::new(endpoint.clone(), Duration::from_secs(timeout))
            })
            .transpose()
    }

    pub fn isolation_forest(&self) -> IsolationForest {
        IsolationForest::new(
            self.analysis.trees,
            self.analysis.max_samples,
            self.analysis.contamination,
            self.analysis.seed,
        )
    }

    pub fn risk_policy(&self) -> RiskPolicy {
        RiskPolicy {
            holidays: self.risk.holidays.clone().unwrap_or_else(default_holidays),
            restricted_mobility: self
                .risk
                .restricted_mobility
                .clone()
                .unwrap_or_else(default_restricted_mobility),
        }
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ReportSettings for TomlConfig {
    fn facility_name(&self) -> &str {
        &self.facility.name
    }

    fn report_filename(&self) -> &str {
        self.report
            .filename
            .as_deref()
            .unwrap_or(DEFAULT_REPORT_FILENAME)
    }

    fn output_path(&self) -> &str {
        &self.report.output_path
    }

    fn section_enabled(&self, section: &str) -> bool {
        match &self.report.sections {
            Some(sections) => sections.iter().any(|s| s == section),
            None => true,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[facility]
name = "Haus Sonnenschein"

[data]
base_path = "./data"
database = "care.db"

[report]
output_path = "./output"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.facility_name(), "Haus Sonnenschein");
        assert_eq!(config.data_files(), DataFiles::default());
        assert_eq!(config.database_path(), Path::new("./data").join("care.db"));
        assert_eq!(config.report_filename(), DEFAULT_REPORT_FILENAME);
        assert!(REPORT_SECTIONS.iter().all(|s| config.section_enabled(s)));
        assert!(!config.monitoring_enabled());
        assert!(config.weather_source().unwrap().is_none());

        let forest = config.isolation_forest();
        assert_eq!(forest.trees, DEFAULT_TREES);
        assert_eq!(forest.seed, DEFAULT_SEED);
        assert_eq!(config.risk_policy(), RiskPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[facility]
name = "Pflegeheim Nord"

[data]
base_path = "/srv/care"
residents = "bewohner.csv"
meal_orders = "bestellungen.csv"
weather = "wetter.csv"
health = "vitals.csv"
database = "/var/lib/care/care.db"

[weather_api]
endpoint = "https://weather.example.com/daily"
timeout_seconds = 5

[analysis]
contamination = 0.2
seed = 7

[risk]
restricted_mobility = ["bedridden"]
holidays = [{ date = "03-15", name = "Founders Day" }]

[report]
output_path = "./reports"
filename = "nord.zip"
sections = ["nutrition", "risk"]

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_files().health_records, "vitals.csv");
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/care/care.db"));
        assert_eq!(config.analysis.trees, DEFAULT_TREES);
        assert_eq!(config.isolation_forest().contamination, 0.2);
        assert!(config.section_enabled("risk"));
        assert!(!config.section_enabled("weather"));
        assert!(config.monitoring_enabled());

        let policy = config.risk_policy();
        assert_eq!(policy.holidays, vec![Holiday::new("03-15", "Founders Day")]);
        assert!(policy.is_restricted("Bedridden"));

        let weather = config.weather_source().unwrap().unwrap();
        assert_eq!(weather.endpoint(), "https://weather.example.com/daily");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CARE_INSIGHTS_TEST_FACILITY", "Seniorenresidenz");

        let toml_content = MINIMAL.replace("Haus Sonnenschein", "${CARE_INSIGHTS_TEST_FACILITY}");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.facility.name, "Seniorenresidenz");

        std::env::remove_var("CARE_INSIGHTS_TEST_FACILITY");
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_contamination = format!("{}\n[analysis]\ncontamination = 0.7\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&bad_contamination).unwrap();
        assert!(config.validate().is_err());

        let bad_section = MINIMAL.replace(
            "output_path = \"./output\"",
            "output_path = \"./output\"\nsections = [\"charts\"]",
        );
        let config = TomlConfig::from_toml_str(&bad_section).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("charts"));

        let bad_endpoint = format!("{}\n[weather_api]\nendpoint = \"invalid-url\"\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&bad_endpoint).unwrap();
        assert!(config.validate().is_err());

        // 有 [weather_api] 區段卻沒有 endpoint
        let no_endpoint = format!("{}\n[weather_api]\ntimeout_seconds = 5\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&no_endpoint).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CareError::MissingConfigError { ref field } if field == "weather_api.endpoint"));
        assert!(config.weather_source().is_err());

        let bad_holiday = format!(
            "{}\n[risk]\nholidays = [{{ date = \"13-40\", name = \"Nope\" }}]\n",
            MINIMAL
        );
        let config = TomlConfig::from_toml_str(&bad_holiday).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = TomlConfig::from_toml_str("[facility]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, CareError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.facility.name, "Haus Sonnenschein");
        assert!(TomlConfig::from_file("/nonexistent/care-insights.toml").is_err());
    }
}
