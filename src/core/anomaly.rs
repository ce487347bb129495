use crate::core::correlation::daily_consumption;
use crate::core::stats::{mean, sample_std, StandardScaler};
use crate::domain::model::{MealOrder, MealType, Resident, ResidentId};
use crate::domain::ports::OutlierScorer;
use crate::domain::report::{MealPatternAnomaly, ResidentConsumptionAnomaly};
use crate::utils::error::{CareError, Result};
use std::collections::{BTreeMap, HashMap};

/// 雙尾 z 分數門檻
pub const Z_SCORE_THRESHOLD: f64 = 2.0;

/// Flags residents whose consumption mean and spread stand out from the cohort.
///
/// Only residents present in both inputs are scored. A resident with a single
/// meal has a spread of 0.
pub fn detect_consumption_anomalies<O: OutlierScorer + ?Sized>(
    meal_orders: &[MealOrder],
    residents: &[Resident],
    scorer: &O,
) -> Result<Vec<ResidentConsumptionAnomaly>> {
    let residents_by_id: HashMap<ResidentId, &Resident> =
        residents.iter().map(|r| (r.resident_id, r)).collect();

    let mut consumption: BTreeMap<ResidentId, Vec<f64>> = BTreeMap::new();
    for order in meal_orders
        .iter()
        .filter(|o| residents_by_id.contains_key(&o.resident_id))
    {
        consumption
            .entry(order.resident_id)
            .or_default()
            .push(order.actual_consumption);
    }

    let stats: Vec<(ResidentId, f64, f64, usize)> = consumption
        .into_iter()
        .filter_map(|(resident_id, values)| {
            let m = mean(&values)?;
            let s = sample_std(&values).unwrap_or(0.0);
            Some((resident_id, m, s, values.len()))
        })
        .collect();

    if stats.is_empty() {
        tracing::debug!("No resident has both meal orders and a resident record");
        return Ok(Vec::new());
    }

    let features: Vec<Vec<f64>> = stats.iter().map(|(_, m, s, _)| vec![*m, *s]).collect();
    let scaled = StandardScaler::fit_transform(&features);
    let flags = scorer.fit_predict(&scaled)?;
    if flags.len() != stats.len() {
        return Err(CareError::processing(format!(
            "outlier scorer returned {} flags for {} residents",
            flags.len(),
            stats.len()
        )));
    }

    let rows: Vec<ResidentConsumptionAnomaly> = stats
        .into_iter()
        .zip(flags)
        .filter_map(|((resident_id, m, s, count), is_anomaly)| {
            let resident = residents_by_id.get(&resident_id)?;
            Some(ResidentConsumptionAnomaly {
                resident_id,
                mean_consumption: m,
                std_consumption: s,
                meal_count: count,
                is_anomaly,
                age: resident.age,
                care_level: resident.care_level,
                special_dietary_requirements: resident.special_dietary_requirements.clone(),
            })
        })
        .collect();

    tracing::debug!(
        "Resident anomaly detection flagged {} of {} residents",
        rows.iter().filter(|r| r.is_anomaly).count(),
        rows.len()
    );
    Ok(rows)
}

/// Flags (date, meal type) observations whose z-score within the meal type
/// exceeds the threshold. Meal types without a positive standard deviation
/// get no z-score and are never flagged.
pub fn detect_meal_pattern_anomalies(meal_orders: &[MealOrder]) -> Vec<MealPatternAnomaly> {
    let daily = daily_consumption(meal_orders);

    let mut per_meal_type: HashMap<&MealType, Vec<f64>> = HashMap::new();
    for (_, meal_type, value) in &daily {
        per_meal_type.entry(meal_type).or_default().push(*value);
    }
    let meal_stats: HashMap<MealType, (f64, Option<f64>)> = per_meal_type
        .into_iter()
        .filter_map(|(meal_type, values)| {
            mean(&values).map(|m| (meal_type.clone(), (m, sample_std(&values))))
        })
        .collect();

    daily
        .iter()
        .filter_map(|(date, meal_type, value)| {
            let (m, s) = *meal_stats.get(meal_type)?;
            let z_score = s.filter(|s| *s > 0.0).map(|s| (value - m) / s);
            Some(MealPatternAnomaly {
                date: *date,
                meal_type: meal_type.clone(),
                actual_consumption: *value,
                mean_consumption: m,
                std_consumption: s,
                z_score,
                is_anomaly: z_score.is_some_and(|z| z.abs() > Z_SCORE_THRESHOLD),
            })
        })
        .collect()
}
