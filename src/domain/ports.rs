use crate::domain::model::{
    CareDataset, HealthRecord, MealOrder, Resident, ResidentId, WeatherObservation,
};
use crate::domain::report::InsightReport;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 表格資料的讀取介面，取代全域快取
#[async_trait]
pub trait CareDataSource: Send + Sync {
    async fn load_residents(&self) -> Result<Vec<Resident>>;
    async fn load_meal_orders(&self) -> Result<Vec<MealOrder>>;
    async fn load_weather(&self) -> Result<Vec<WeatherObservation>>;
    async fn load_health_records(&self) -> Result<Vec<HealthRecord>>;

    async fn load_dataset(&self) -> Result<CareDataset> {
        Ok(CareDataset {
            residents: self.load_residents().await?,
            meal_orders: self.load_meal_orders().await?,
            weather: self.load_weather().await?,
            health_records: self.load_health_records().await?,
        })
    }
}

pub trait ActivityRepository {
    /// 每日活動參與次數，依日期遞增排序
    fn participation_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, u32)>>;
}

pub trait OutingRepository {
    /// 依出發時間分組的外出次數，依時間遞增排序
    fn visit_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, u32)>>;
}

pub trait ResidentCareRepository {
    fn resident_ids(&self) -> Result<Vec<ResidentId>>;
    fn mobility_status(&self, resident_id: ResidentId) -> Result<Option<String>>;
    fn count_falls_since(&self, resident_id: ResidentId, since: NaiveDate) -> Result<u32>;
}

/// 風險評分所需的全部儲存庫
pub trait CareRepository: ActivityRepository + OutingRepository + ResidentCareRepository {}

impl<T: ActivityRepository + OutingRepository + ResidentCareRepository> CareRepository for T {}

/// 非監督式離群值判定。每列一個樣本，回傳是否為異常。
pub trait OutlierScorer {
    fn fit_predict(&self, samples: &[Vec<f64>]) -> Result<Vec<bool>>;
}

pub trait ReportSettings: Send + Sync {
    fn facility_name(&self) -> &str;
    fn report_filename(&self) -> &str;
    fn output_path(&self) -> &str;
    fn section_enabled(&self, section: &str) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<CareDataset>;
    async fn transform(&self, data: CareDataset) -> Result<InsightReport>;
    async fn load(&self, report: InsightReport) -> Result<String>;
}
