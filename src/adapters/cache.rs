use crate::domain::model::{CareDataset, HealthRecord, MealOrder, Resident, WeatherObservation};
use crate::domain::ports::CareDataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Loads the wrapped source once per instance and serves copies afterwards.
///
/// A failed load is not cached; the next call tries again.
pub struct CachedDataSource<D: CareDataSource> {
    inner: D,
    dataset: OnceCell<CareDataset>,
}

impl<D: CareDataSource> CachedDataSource<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            dataset: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.initialized()
    }

    async fn cached(&self) -> Result<&CareDataset> {
        self.dataset
            .get_or_try_init(|| async {
                tracing::debug!("Dataset cache miss, loading from source");
                self.inner.load_dataset().await
            })
            .await
    }
}

#[async_trait]
impl<D: CareDataSource> CareDataSource for CachedDataSource<D> {
    async fn load_residents(&self) -> Result<Vec<Resident>> {
        Ok(self.cached().await?.residents.clone())
    }

    async fn load_meal_orders(&self) -> Result<Vec<MealOrder>> {
        Ok(self.cached().await?.meal_orders.clone())
    }

    async fn load_weather(&self) -> Result<Vec<WeatherObservation>> {
        Ok(self.cached().await?.weather.clone())
    }

    async fn load_health_records(&self) -> Result<Vec<HealthRecord>> {
        Ok(self.cached().await?.health_records.clone())
    }

    async fn load_dataset(&self) -> Result<CareDataset> {
        Ok(self.cached().await?.clone())
    }
}
