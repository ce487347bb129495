use care_insights::domain::ports::ReportSettings;
use care_insights::utils::error::{CareError, ErrorSeverity};
use care_insights::utils::{logger, validation::Validate};
use care_insights::{
    CliConfig, CsvDataSource, InsightsEngine, InsightsPipeline, LocalStorage, SqliteCareStore,
    TomlConfig,
};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting care-insights");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    if let Err(e) = args.validate() {
        fail_config(&e);
    }

    tracing::info!("📁 Loading configuration from: {}", args.config.display());
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {}",
                args.config.display(),
                e
            );
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        fail_config(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No analysis will run");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor_enabled(&config);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config, &args, monitor_enabled).await {
        Ok(output_path) => {
            tracing::info!("✅ Care insights report completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Care insights report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Care insights run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,      // 警告，但成功
                ErrorSeverity::Medium => 2,   // 可重試
                ErrorSeverity::High => 1,     // 資料或處理錯誤
                ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &TomlConfig, args: &CliConfig, monitor_enabled: bool) -> Result<String, CareError> {
    let mut source = CsvDataSource::new(
        LocalStorage::new(&config.data.base_path),
        config.data_files(),
    );
    if let Some(weather_api) = config.weather_source()? {
        tracing::info!("🌦️ Fetching weather from: {}", weather_api.endpoint());
        source = source.with_weather_api(weather_api);
    }

    let store = SqliteCareStore::open(config.database_path())?;

    let storage = LocalStorage::new(config.output_path());
    let reference_date = args.reference_date();
    tracing::info!("📅 Reference date for risk scoring: {}", reference_date);

    let pipeline = InsightsPipeline::new(source, storage, store, config.clone(), reference_date)
        .with_scorer(config.isolation_forest())
        .with_risk_policy(config.risk_policy());

    let engine = InsightsEngine::new_with_monitoring(pipeline, monitor_enabled);
    engine.run().await
}

fn fail_config(e: &CareError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(1);
}

fn display_config_summary(config: &TomlConfig, args: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!("  Facility: {}", config.facility_name());
    println!("  Data: {}", config.data.base_path);
    println!("  Database: {}", config.database_path().display());
    match &config.weather_api {
        Some(api) => println!(
            "  Weather: {} (HTTP)",
            api.endpoint.as_deref().unwrap_or("<missing endpoint>")
        ),
        None => println!("  Weather: {} (CSV)", config.data_files().weather),
    }
    println!(
        "  Output: {}/{}",
        config.output_path(),
        config.report_filename()
    );
    println!("  Reference date: {}", args.reference_date());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 輸入檔案檢查
    println!("📡 Input Files:");
    let files = config.data_files();
    let base = Path::new(&config.data.base_path);
    for name in [
        &files.residents,
        &files.meal_orders,
        &files.weather,
        &files.health_records,
    ] {
        let marker = if base.join(name).is_file() { "✅" } else { "❌" };
        println!("  {} {}", marker, name);
    }
    let db_marker = if config.database_path().is_file() {
        "✅"
    } else {
        "❌"
    };
    println!("  {} {}", db_marker, config.database_path().display());

    // 分析參數
    println!();
    println!("⚙️ Analysis:");
    println!(
        "  Isolation forest: {} trees, max {} samples, contamination {}, seed {}",
        config.analysis.trees,
        config.analysis.max_samples,
        config.analysis.contamination,
        config.analysis.seed
    );
    let policy = config.risk_policy();
    println!(
        "  Risk tables: {} holidays, {} restricted mobility statuses",
        policy.holidays.len(),
        policy.restricted_mobility.len()
    );

    // 輸出分析
    println!();
    println!("💾 Report Sections:");
    for section in care_insights::domain::report::REPORT_SECTIONS {
        let marker = if config.section_enabled(section) {
            "✅"
        } else {
            "⏭️"
        };
        println!("  {} {}", marker, section);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
