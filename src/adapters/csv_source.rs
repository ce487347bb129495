use crate::adapters::weather_api::HttpWeatherSource;
use crate::domain::model::{HealthRecord, MealOrder, Resident, WeatherObservation};
use crate::domain::ports::{CareDataSource, Storage};
use crate::utils::error::{CareError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// 各資料表在儲存空間中的檔名
#[derive(Debug, Clone, PartialEq)]
pub struct DataFiles {
    pub residents: String,
    pub meal_orders: String,
    pub weather: String,
    pub health_records: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            residents: "residents.csv".to_string(),
            meal_orders: "meal_orders.csv".to_string(),
            weather: "weather_data.csv".to_string(),
            health_records: "health_monitoring.csv".to_string(),
        }
    }
}

/// Loads the facility tables from CSV files through a [`Storage`].
///
/// Extra columns are ignored. Weather can come from an HTTP endpoint
/// instead of the weather file.
pub struct CsvDataSource<S: Storage> {
    storage: S,
    files: DataFiles,
    weather_api: Option<HttpWeatherSource>,
}

impl<S: Storage> CsvDataSource<S> {
    pub fn new(storage: S, files: DataFiles) -> Self {
        Self {
            storage,
            files,
            weather_api: None,
        }
    }

    pub fn with_weather_api(mut self, weather_api: HttpWeatherSource) -> Self {
        self.weather_api = Some(weather_api);
        self
    }

    async fn read_table<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let bytes = self.storage.read_file(file).await.map_err(|e| match e {
            CareError::IoError(io) => CareError::data(file, format!("cannot read file: {}", io)),
            other => other,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());

        let rows = reader
            .deserialize::<T>()
            .enumerate()
            .map(|(index, row)| {
                row.map_err(|e| CareError::data(file, format!("row {}: {}", index + 1, e)))
            })
            .collect::<Result<Vec<T>>>()?;

        tracing::debug!("Loaded {} rows from {}", rows.len(), file);
        Ok(rows)
    }
}

fn check_consumption(file: &str, orders: &[MealOrder]) -> Result<()> {
    for (index, order) in orders.iter().enumerate() {
        let value = order.actual_consumption;
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CareError::data(
                file,
                format!(
                    "row {}: actual_consumption {} is outside [0, 1]",
                    index + 1,
                    value
                ),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl<S: Storage> CareDataSource for CsvDataSource<S> {
    async fn load_residents(&self) -> Result<Vec<Resident>> {
        self.read_table(&self.files.residents).await
    }

    async fn load_meal_orders(&self) -> Result<Vec<MealOrder>> {
        let orders: Vec<MealOrder> = self.read_table(&self.files.meal_orders).await?;
        check_consumption(&self.files.meal_orders, &orders)?;
        Ok(orders)
    }

    async fn load_weather(&self) -> Result<Vec<WeatherObservation>> {
        match &self.weather_api {
            Some(api) => api.fetch().await,
            None => self.read_table(&self.files.weather).await,
        }
    }

    async fn load_health_records(&self) -> Result<Vec<HealthRecord>> {
        self.read_table(&self.files.health_records).await
    }
}
