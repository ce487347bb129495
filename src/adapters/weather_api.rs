use crate::domain::model::WeatherObservation;
use crate::utils::error::{CareError, Result};
use reqwest::Client;
use std::time::Duration;

const SOURCE_NAME: &str = "weather api";

/// Daily weather observations served as a JSON array over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWeatherSource {
    client: Client,
    endpoint: String,
}

impl HttpWeatherSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch(&self) -> Result<Vec<WeatherObservation>> {
        tracing::debug!("Making weather request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        tracing::debug!("Weather API response status: {}", status);
        if !status.is_success() {
            return Err(CareError::data(
                SOURCE_NAME,
                format!("{} returned HTTP {}", self.endpoint, status),
            ));
        }

        // 先取原始 JSON，格式錯誤時能回報是哪一筆
        let payload: serde_json::Value = response.json().await?;
        let serde_json::Value::Array(items) = payload else {
            return Err(CareError::data(
                SOURCE_NAME,
                "expected a JSON array of observations",
            ));
        };

        let observations = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<WeatherObservation>(item).map_err(|e| {
                    CareError::data(SOURCE_NAME, format!("observation {}: {}", index + 1, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} weather observations", observations.len());
        Ok(observations)
    }
}
