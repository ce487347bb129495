use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "care-insights")]
#[command(about = "Nutrition, anomaly and risk insights for care facilities")]
pub struct CliConfig {
    #[arg(long, default_value = "care-insights.toml")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Override [monitoring] enabled (true/false)")]
    pub monitor: Option<bool>,

    #[arg(long, help = "Reference date for risk scoring (YYYY-MM-DD), defaults to today")]
    pub today: Option<NaiveDate>,

    #[arg(long, help = "Print the configuration summary and exit")]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn reference_date(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// 命令列的 --monitor 優先於設定檔
    pub fn monitor_enabled(&self, config: &TomlConfig) -> bool {
        self.monitor.unwrap_or_else(|| config.monitoring_enabled())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let path = self.config.to_string_lossy();
        validation::validate_path("config", &path)?;
        validation::validate_file_extensions("config", &[path.as_ref()], &["toml"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = CliConfig::try_parse_from(["care-insights"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("care-insights.toml"));
        assert!(!cli.verbose);
        assert!(!cli.dry_run);
        assert_eq!(cli.monitor, None);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let cli = CliConfig::try_parse_from([
            "care-insights",
            "--config",
            "nord.toml",
            "--monitor",
            "false",
            "--today",
            "2024-12-20",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(cli.monitor, Some(false));
        assert!(cli.json_logs);
        assert_eq!(
            cli.reference_date(),
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_date_and_extension() {
        assert!(CliConfig::try_parse_from(["care-insights", "--today", "20.12.2024"]).is_err());

        let cli =
            CliConfig::try_parse_from(["care-insights", "--config", "settings.yaml"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
