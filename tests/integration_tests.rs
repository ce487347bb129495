use care_insights::domain::model::ResidentCare;
use care_insights::utils::error::ErrorSeverity;
use care_insights::utils::validation::Validate;
use care_insights::{
    CsvDataSource, InsightsEngine, InsightsPipeline, LocalStorage, SqliteCareStore, TomlConfig,
};
use chrono::NaiveDate;
use httpmock::prelude::*;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// 10 位住民、6 天的早餐與午餐；住民 10 幾乎不進食
fn write_csv_fixtures(dir: &Path) {
    let mut residents = String::from("resident_id,name,age,care_level,special_dietary_requirements\n");
    for id in 1..=10 {
        residents.push_str(&format!("{},Resident {},{},{},\n", id, id, 79 + id, id % 5 + 1));
    }
    fs::write(dir.join("residents.csv"), residents).unwrap();

    let mut orders = String::from("resident_id,date,meal_type,actual_consumption\n");
    for id in 1..=10 {
        for day in 1..=6 {
            let (breakfast, lunch) = if id == 10 {
                (0.05, if day % 2 == 0 { 0.1 } else { 0.5 })
            } else {
                (
                    0.70 + id as f64 * 0.01,
                    0.50 + day as f64 * 0.05 + id as f64 * 0.002,
                )
            };
            orders.push_str(&format!("{},2024-06-0{},Frühstück,{:.3}\n", id, day, breakfast));
            orders.push_str(&format!(
                "{},2024-06-0{} 12:00:00,Mittagessen,{:.3}\n",
                id, day, lunch
            ));
        }
    }
    fs::write(dir.join("meal_orders.csv"), orders).unwrap();

    fs::write(
        dir.join("health_monitoring.csv"),
        "resident_id,date,blood_pressure_systolic,heart_rate,weight\n\
         1,2024-06-01,130,72,61.0\n\
         2,2024-06-01,145,80,70.5\n\
         1,2024-06-02,128,70,60.8\n",
    )
    .unwrap();
}

fn write_care_database(path: &Path) {
    let store = SqliteCareStore::create(path).unwrap();
    store
        .insert_resident(&ResidentCare {
            resident_id: 1,
            mobility_status: Some("Hilfsmittel benötigt".to_string()),
            last_fall_date: None,
        })
        .unwrap();
    store
        .insert_resident(&ResidentCare {
            resident_id: 2,
            mobility_status: Some("mobile".to_string()),
            last_fall_date: Some(date(6, 1)),
        })
        .unwrap();
    store
        .insert_resident(&ResidentCare {
            resident_id: 3,
            mobility_status: None,
            last_fall_date: Some(date(1, 5)),
        })
        .unwrap();

    for day in 1..=9 {
        store.insert_activity(2, date(6, day)).unwrap();
    }
    for day in [2, 4, 6, 8] {
        store
            .insert_outing(2, date(6, day).and_hms_opt(14, 0, 0).unwrap())
            .unwrap();
    }
}

fn read_member(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_report_with_weather_api() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_csv_fixtures(data_dir.path());
    write_care_database(&data_dir.path().join("care.db"));

    // 天氣 API 多一天沒有對應的餐點資料
    let server = MockServer::start();
    let observations: Vec<serde_json::Value> = (1..=7)
        .map(|day| {
            serde_json::json!({
                "date": format!("2024-06-0{}", day),
                "temperature": 15.0 + day as f64,
                "precipitation": if day % 2 == 0 { 2.5 } else { 0.0 },
                "humidity": 40.0 + day as f64 * 3.0,
                "weather_condition": if day % 2 == 0 { "rainy" } else { "sunny" },
            })
        })
        .collect();
    let weather_mock = server.mock(|when, then| {
        when.method(GET).path("/weather/daily");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::Value::Array(observations));
    });

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[facility]
name = "Haus Sonnenschein"

[data]
base_path = '{}'
database = "care.db"

[weather_api]
endpoint = "{}"
timeout_seconds = 5

[report]
output_path = '{}'
"#,
        data_dir.path().display(),
        server.url("/weather/daily"),
        output_dir.path().display()
    ))?;
    config.validate()?;

    let source = CsvDataSource::new(
        LocalStorage::new(&config.data.base_path),
        config.data_files(),
    )
    .with_weather_api(config.weather_source()?.expect("weather api configured"));
    let store = SqliteCareStore::open(config.database_path())?;
    let pipeline = InsightsPipeline::new(
        source,
        LocalStorage::new(output_dir.path()),
        store,
        config.clone(),
        date(6, 10),
    )
    .with_scorer(config.isolation_forest())
    .with_risk_policy(config.risk_policy());

    let engine = InsightsEngine::new_with_monitoring(pipeline, false);
    let output_path = engine.run().await?;

    weather_mock.assert();
    assert!(output_path.ends_with("care_insights_report.zip"));

    let zip_path = output_dir.path().join("care_insights_report.zip");
    assert!(zip_path.exists());
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(fs::read(&zip_path)?))?;

    let names: Vec<String> = archive.file_names().map(String::from).collect();
    for expected in [
        "overview.csv",
        "age_distribution.csv",
        "nutrition_consumption.csv",
        "nutrition_waste.csv",
        "care_level_consumption.csv",
        "daily_waste.csv",
        "health_summary.csv",
        "weather_consumption.csv",
        "weather_correlations.csv",
        "weather_conditions.csv",
        "resident_anomalies.csv",
        "meal_anomalies.csv",
        "risk_assessments.json",
        "report.json",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }

    // 只有 6 月 1-6 日能與天氣對上
    let joined = read_member(&mut archive, "weather_consumption.csv");
    assert_eq!(joined.lines().count(), 1 + 6 * 2);
    assert!(!joined.contains("2024-06-07"));

    let correlations = read_member(&mut archive, "weather_correlations.csv");
    let mut reader = csv::Reader::from_reader(correlations.as_bytes());
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        rows += 1;
        for field in [2, 3, 4] {
            if !record[field].is_empty() {
                let r: f64 = record[field].parse()?;
                assert!((-1.0..=1.0).contains(&r));
            }
        }
    }
    assert_eq!(rows, 2);

    let resident_anomalies = read_member(&mut archive, "resident_anomalies.csv");
    let mut reader = csv::Reader::from_reader(resident_anomalies.as_bytes());
    let flagged: Vec<String> = reader
        .records()
        .filter_map(|r| r.ok())
        .filter(|r| &r[4] == "true")
        .map(|r| r[0].to_string())
        .collect();
    assert_eq!(flagged, vec!["10".to_string()]);

    let meal_anomalies = read_member(&mut archive, "meal_anomalies.csv");
    let mut reader = csv::Reader::from_reader(meal_anomalies.as_bytes());
    for record in reader.records() {
        let record = record?;
        let expected = match &record[5] {
            "" => false,
            z => z.parse::<f64>()?.abs() > 2.0,
        };
        assert_eq!(&record[6], expected.to_string().as_str());
    }

    let risk: serde_json::Value =
        serde_json::from_str(&read_member(&mut archive, "risk_assessments.json"))?;
    let risk = risk.as_array().unwrap();
    assert_eq!(risk.len(), 3);

    // 住民 1：無活動、無外出、行動受限
    assert_eq!(risk[0]["resident_id"], 1);
    assert_eq!(risk[0]["social_isolation"]["score"], 70);
    assert_eq!(risk[0]["fall"]["score"], 30);
    assert_eq!(risk[0]["fall"]["factors"][0], "limited mobility");

    // 住民 2：活動與外出正常，9 天前跌倒一次
    assert_eq!(risk[1]["social_isolation"]["score"], 0);
    assert_eq!(risk[1]["fall"]["score"], 20);
    assert_eq!(risk[1]["fall"]["factors"][0], "1 falls in the last 90 days");

    // 住民 3：沒有行動狀態，跌倒已超過 90 天
    assert_eq!(risk[2]["fall"]["score"], 0);
    assert_eq!(risk[2]["fall"]["factors"][0], "no mobility status recorded");

    let metadata: serde_json::Value =
        serde_json::from_str(&read_member(&mut archive, "report.json"))?;
    assert_eq!(metadata["facility"], "Haus Sonnenschein");
    assert_eq!(metadata["reference_date"], "2024-06-10");
    assert_eq!(metadata["counts"]["residents_assessed"], 3);
    assert_eq!(metadata["counts"]["resident_anomalies"], 1);
    assert_eq!(metadata["counts"]["weather_days_joined"], 6);
    assert_eq!(metadata["weather_data_available"], true);

    Ok(())
}

#[tokio::test]
async fn test_weather_files_omitted_when_dates_do_not_overlap() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_csv_fixtures(data_dir.path());
    fs::write(
        data_dir.path().join("weather_data.csv"),
        "date,temperature,precipitation,humidity,weather_condition\n2023-01-01,1.0,0.0,80,snow\n",
    )?;

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[facility]
name = "Haus Sonnenschein"

[data]
base_path = '{}'
database = "care.db"

[report]
output_path = '{}'
filename = "weather_only.zip"
sections = ["weather"]
"#,
        data_dir.path().display(),
        output_dir.path().display()
    ))?;
    config.validate()?;

    let pipeline = InsightsPipeline::new(
        CsvDataSource::new(LocalStorage::new(data_dir.path()), config.data_files()),
        LocalStorage::new(output_dir.path()),
        SqliteCareStore::open_in_memory()?,
        config.clone(),
        date(6, 10),
    );
    InsightsEngine::new(pipeline).run().await?;

    let bytes = fs::read(output_dir.path().join("weather_only.zip"))?;
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names, vec!["report.json"]);

    Ok(())
}

#[tokio::test]
async fn test_mistyped_database_path_fails_before_reporting() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    write_csv_fixtures(data_dir.path());
    write_care_database(&data_dir.path().join("care.db"));

    let config = TomlConfig::from_toml_str(&format!(
        "[facility]\nname = \"x\"\n[data]\nbase_path = '{0}'\ndatabase = \"typo_care.db\"\n[report]\noutput_path = '{0}'\n",
        data_dir.path().display()
    ))?;

    let err = SqliteCareStore::open(config.database_path()).err().unwrap();
    assert!(err.to_string().contains("typo_care.db"));
    assert_eq!(err.severity(), ErrorSeverity::High);
    assert!(!config.database_path().exists());

    Ok(())
}

#[tokio::test]
async fn test_malformed_meal_orders_fail_the_run() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_csv_fixtures(data_dir.path());
    fs::write(
        data_dir.path().join("meal_orders.csv"),
        "resident_id,date,meal_type,actual_consumption\n1,2024-06-01,lunch,not-a-number\n",
    )?;
    fs::write(
        data_dir.path().join("weather_data.csv"),
        "date,temperature,precipitation,humidity,weather_condition\n",
    )?;

    let pipeline = InsightsPipeline::new(
        CsvDataSource::new(LocalStorage::new(data_dir.path()), Default::default()),
        LocalStorage::new(output_dir.path()),
        SqliteCareStore::open_in_memory()?,
        TomlConfig::from_toml_str(&format!(
            "[facility]\nname = \"x\"\n[data]\nbase_path = '{}'\ndatabase = \"care.db\"\n[report]\noutput_path = '{}'\n",
            data_dir.path().display(),
            output_dir.path().display()
        ))?,
        date(6, 10),
    );

    let err = InsightsEngine::new(pipeline).run().await.unwrap_err();
    assert!(err.to_string().contains("meal_orders.csv"));
    assert!(!output_dir.path().join("care_insights_report.zip").exists());

    Ok(())
}
