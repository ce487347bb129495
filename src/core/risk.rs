use crate::domain::model::{ResidentId, RiskAssessment};
use crate::domain::ports::{
    ActivityRepository, CareRepository, OutingRepository, ResidentCareRepository,
};
use crate::domain::report::ResidentRiskProfile;
use crate::utils::error::Result;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const ACTIVITY_WINDOW_DAYS: u64 = 30;
pub const VISIT_WINDOW_DAYS: u64 = 30;
pub const FALL_WINDOW_DAYS: u64 = 90;
pub const HOLIDAY_LOOKAHEAD_DAYS: i64 = 7;
pub const ROLLING_WINDOW: usize = 7;
/// 每兩天不到一次外出
pub const MIN_AVERAGE_VISITS: f64 = 0.5;
pub const MAX_SCORE: u32 = 100;

const NO_ACTIVITY_POINTS: u32 = 40;
const DECLINING_ACTIVITY_POINTS: u32 = 30;
const NO_VISITS_POINTS: u32 = 30;
const FEW_VISITS_POINTS: u32 = 30;
const HOLIDAY_POINTS: u32 = 20;
const LIMITED_MOBILITY_POINTS: u32 = 30;
const POINTS_PER_FALL: u32 = 20;
const MAX_FALL_POINTS: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// "MM-DD"
    pub date: String,
    pub name: String,
}

impl Holiday {
    pub fn new(date: &str, name: &str) -> Self {
        Self {
            date: date.to_string(),
            name: name.to_string(),
        }
    }

    /// 該節日在指定年份的日期；2 月 29 日在平年不存在
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        let (month, day) = self.date.split_once('-')?;
        NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
    }
}

/// 奧地利固定日期的國定假日
pub fn default_holidays() -> Vec<Holiday> {
    vec![
        Holiday::new("01-01", "New Year's Day"),
        Holiday::new("01-06", "Epiphany"),
        Holiday::new("05-01", "Labour Day"),
        Holiday::new("08-15", "Assumption Day"),
        Holiday::new("10-26", "National Day"),
        Holiday::new("11-01", "All Saints' Day"),
        Holiday::new("12-08", "Immaculate Conception"),
        Holiday::new("12-25", "Christmas Day"),
        Holiday::new("12-26", "St. Stephen's Day"),
    ]
}

pub fn default_restricted_mobility() -> Vec<String> {
    ["limited", "assistive device required", "eingeschränkt", "Hilfsmittel benötigt"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Tables the heuristic scorers read besides the repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub holidays: Vec<Holiday>,
    pub restricted_mobility: Vec<String>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            holidays: default_holidays(),
            restricted_mobility: default_restricted_mobility(),
        }
    }
}

impl RiskPolicy {
    pub fn is_restricted(&self, mobility_status: &str) -> bool {
        let status = mobility_status.trim().to_lowercase();
        self.restricted_mobility
            .iter()
            .any(|restricted| restricted.to_lowercase() == status)
    }

    /// 今天起 0 到 7 天內 (含) 的當年節日
    pub fn upcoming_holidays(&self, today: NaiveDate) -> Vec<&Holiday> {
        self.holidays
            .iter()
            .filter(|holiday| {
                holiday
                    .in_year(today.year())
                    .map(|date| (date - today).num_days())
                    .is_some_and(|days| (0..=HOLIDAY_LOOKAHEAD_DAYS).contains(&days))
            })
            .collect()
    }
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn finish(points: u32, factors: Vec<String>) -> RiskAssessment {
    RiskAssessment {
        score: points.min(MAX_SCORE) as u8,
        factors,
    }
}

/// Trailing rolling mean; `None` until the window is full.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// 最近的 7 日平均是否低於倒數第 7 個 7 日平均
fn activity_declining(counts: &[(NaiveDate, u32)]) -> bool {
    if counts.len() < ROLLING_WINDOW {
        return false;
    }
    let values: Vec<f64> = counts.iter().map(|(_, c)| f64::from(*c)).collect();
    let rolling = rolling_mean(&values, ROLLING_WINDOW);
    let latest = rolling[rolling.len() - 1];
    let earlier = rolling[rolling.len() - ROLLING_WINDOW];
    matches!((latest, earlier), (Some(latest), Some(earlier)) if latest < earlier)
}

/// Social isolation risk from activity trend, visit frequency and upcoming
/// holidays. `today` anchors every window.
pub fn social_isolation_risk<R>(
    repo: &R,
    resident_id: ResidentId,
    today: NaiveDate,
    policy: &RiskPolicy,
) -> Result<RiskAssessment>
where
    R: ActivityRepository + OutingRepository + ?Sized,
{
    let mut points = 0;
    let mut factors = Vec::new();

    let mut activity =
        repo.participation_counts_since(resident_id, days_before(today, ACTIVITY_WINDOW_DAYS))?;
    activity.sort_by_key(|(date, _)| *date);
    if activity.is_empty() {
        points += NO_ACTIVITY_POINTS;
        factors.push("no activity participation registered".to_string());
    } else if activity_declining(&activity) {
        points += DECLINING_ACTIVITY_POINTS;
        factors.push("declining activity participation".to_string());
    }

    let visits_since = days_before(today, VISIT_WINDOW_DAYS)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();
    let visits = repo.visit_counts_since(resident_id, visits_since)?;
    if visits.is_empty() {
        points += NO_VISITS_POINTS;
        factors.push("no visits registered".to_string());
    } else {
        let average =
            visits.iter().map(|(_, c)| f64::from(*c)).sum::<f64>() / visits.len() as f64;
        if average < MIN_AVERAGE_VISITS {
            points += FEW_VISITS_POINTS;
            factors.push("few visits".to_string());
        }
    }

    for holiday in policy.upcoming_holidays(today) {
        points += HOLIDAY_POINTS;
        factors.push(format!("upcoming holiday: {}", holiday.name));
    }

    tracing::debug!(
        "Social isolation risk for resident {}: {} points ({} factors)",
        resident_id,
        points,
        factors.len()
    );
    Ok(finish(points, factors))
}

/// Fall risk from mobility status and falls within the last 90 days.
pub fn fall_risk<R>(
    repo: &R,
    resident_id: ResidentId,
    today: NaiveDate,
    policy: &RiskPolicy,
) -> Result<RiskAssessment>
where
    R: ResidentCareRepository + ?Sized,
{
    let mut points = 0;
    let mut factors = Vec::new();

    match repo.mobility_status(resident_id)? {
        Some(status) if policy.is_restricted(&status) => {
            points += LIMITED_MOBILITY_POINTS;
            factors.push("limited mobility".to_string());
        }
        Some(_) => {}
        None => factors.push("no mobility status recorded".to_string()),
    }

    let falls = repo.count_falls_since(resident_id, days_before(today, FALL_WINDOW_DAYS))?;
    if falls > 0 {
        points += (falls.saturating_mul(POINTS_PER_FALL)).min(MAX_FALL_POINTS);
        factors.push(format!("{} falls in the last {} days", falls, FALL_WINDOW_DAYS));
    }

    Ok(finish(points, factors))
}

/// 對儲存庫中的每位住民計算兩種風險
pub fn assess_all_residents<R: CareRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
    policy: &RiskPolicy,
) -> Result<Vec<ResidentRiskProfile>> {
    let mut ids = repo.resident_ids()?;
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .map(|resident_id| {
            Ok(ResidentRiskProfile {
                resident_id,
                social_isolation: social_isolation_risk(repo, resident_id, today, policy)?,
                fall: fall_risk(repo, resident_id, today, policy)?,
            })
        })
        .collect()
}
