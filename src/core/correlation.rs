use crate::core::stats::{mean, pearson};
use crate::domain::model::{MealOrder, MealType, WeatherObservation};
use crate::domain::report::{
    MealCorrelation, WeatherConditionImpact, WeatherConsumption, WeatherCorrelationReport,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// |r| 超過此值視為強相關
pub const STRONG_CORRELATION: f64 = 0.5;

/// 依 (日期, 餐別) 計算平均食用率，依日期與餐別排序
pub fn daily_consumption(meal_orders: &[MealOrder]) -> Vec<(NaiveDate, MealType, f64)> {
    let mut groups: BTreeMap<(NaiveDate, MealType), Vec<f64>> = BTreeMap::new();
    for order in meal_orders {
        groups
            .entry((order.date, order.meal_type.clone()))
            .or_default()
            .push(order.actual_consumption);
    }

    groups
        .into_iter()
        .filter_map(|((date, meal_type), values)| {
            mean(&values).map(|m| (date, meal_type, m))
        })
        .collect()
}

/// Joins daily consumption with weather and correlates per meal type.
///
/// Returns `None` when no meal-order date has a weather observation.
pub fn analyze_weather_correlation(
    meal_orders: &[MealOrder],
    weather: &[WeatherObservation],
) -> Option<WeatherCorrelationReport> {
    let mut weather_by_date: HashMap<NaiveDate, &WeatherObservation> = HashMap::new();
    for observation in weather {
        if weather_by_date.insert(observation.date, observation).is_some() {
            tracing::warn!(
                "Duplicate weather observation for {}, keeping the last one",
                observation.date
            );
        }
    }

    let joined: Vec<WeatherConsumption> = daily_consumption(meal_orders)
        .into_iter()
        .filter_map(|(date, meal_type, consumption)| {
            weather_by_date.get(&date).map(|w| WeatherConsumption {
                date,
                meal_type,
                actual_consumption: consumption,
                temperature: w.temperature,
                precipitation: w.precipitation,
                humidity: w.humidity,
                weather_condition: w.weather_condition.clone(),
            })
        })
        .collect();

    if joined.is_empty() {
        tracing::warn!("No matching dates between meal orders and weather observations");
        return None;
    }

    let mut by_meal_type: BTreeMap<&MealType, Vec<&WeatherConsumption>> = BTreeMap::new();
    for row in &joined {
        by_meal_type.entry(&row.meal_type).or_default().push(row);
    }

    let mut correlations = Vec::new();
    for (meal_type, rows) in by_meal_type {
        if rows.len() < 2 {
            tracing::debug!(
                "Skipping correlation for {}: only {} joined observation(s)",
                meal_type,
                rows.len()
            );
            continue;
        }

        let consumption: Vec<f64> = rows.iter().map(|r| r.actual_consumption).collect();
        let column = |pick: fn(&WeatherConsumption) -> f64| -> Vec<f64> {
            rows.iter().map(|r| pick(r)).collect()
        };

        let correlation = MealCorrelation {
            meal_type: meal_type.clone(),
            observations: rows.len(),
            temperature_correlation: pearson(&column(|r| r.temperature), &consumption),
            precipitation_correlation: pearson(&column(|r| r.precipitation), &consumption),
            humidity_correlation: pearson(&column(|r| r.humidity), &consumption),
        };

        if correlation.temperature_correlation.is_none()
            || correlation.precipitation_correlation.is_none()
            || correlation.humidity_correlation.is_none()
        {
            tracing::debug!(
                "Zero variance for {}: at least one correlation is undefined",
                meal_type
            );
        }
        correlations.push(correlation);
    }

    Some(WeatherCorrelationReport {
        joined,
        correlations,
    })
}

/// 各天氣狀況下的平均食用率
pub fn weather_condition_impact(joined: &[WeatherConsumption]) -> Vec<WeatherConditionImpact> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in joined {
        groups
            .entry(row.weather_condition.as_str())
            .or_default()
            .push(row.actual_consumption);
    }

    groups
        .into_iter()
        .filter_map(|(condition, values)| {
            mean(&values).map(|m| WeatherConditionImpact {
                weather_condition: condition.to_string(),
                mean_consumption: m,
            })
        })
        .collect()
}

/// Human-readable notes for every weather variable with a strong correlation.
pub fn interpret_correlation(correlation: &MealCorrelation) -> Vec<String> {
    [
        ("temperature", correlation.temperature_correlation),
        ("precipitation", correlation.precipitation_correlation),
        ("humidity", correlation.humidity_correlation),
    ]
    .into_iter()
    .filter_map(|(variable, r)| {
        let r = r?;
        if r.abs() <= STRONG_CORRELATION {
            return None;
        }
        let direction = if r > 0.0 { "positive" } else { "negative" };
        Some(format!("strong {} influence of {} (r = {:.2})", direction, variable, r))
    })
    .collect()
}
