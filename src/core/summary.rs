use crate::core::stats::{mean, sample_std};
use crate::domain::model::{HealthRecord, MealOrder, MealType, Resident, ResidentId};
use crate::domain::report::{
    CareLevelConsumption, DailyHealthSummary, DailyWaste, MealTypeConsumption, MealTypeWaste,
    NutritionReport, ResidentOverview,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

fn waste(order: &MealOrder) -> f64 {
    1.0 - order.actual_consumption
}

pub fn consumption_by_meal_type(meal_orders: &[MealOrder]) -> Vec<MealTypeConsumption> {
    let mut groups: BTreeMap<&MealType, Vec<f64>> = BTreeMap::new();
    for order in meal_orders {
        groups
            .entry(&order.meal_type)
            .or_default()
            .push(order.actual_consumption);
    }

    groups
        .into_iter()
        .filter_map(|(meal_type, values)| {
            Some(MealTypeConsumption {
                meal_type: meal_type.clone(),
                mean_consumption: mean(&values)?,
                std_consumption: sample_std(&values),
                count: values.len(),
            })
        })
        .collect()
}

pub fn waste_by_meal_type(meal_orders: &[MealOrder]) -> Vec<MealTypeWaste> {
    let mut groups: BTreeMap<&MealType, Vec<f64>> = BTreeMap::new();
    for order in meal_orders {
        groups.entry(&order.meal_type).or_default().push(waste(order));
    }

    groups
        .into_iter()
        .filter_map(|(meal_type, values)| {
            Some(MealTypeWaste {
                meal_type: meal_type.clone(),
                mean_waste: mean(&values)?,
            })
        })
        .collect()
}

pub fn daily_waste(meal_orders: &[MealOrder]) -> Vec<DailyWaste> {
    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for order in meal_orders {
        groups.entry(order.date).or_default().push(waste(order));
    }

    groups
        .into_iter()
        .filter_map(|(date, values)| {
            Some(DailyWaste {
                date,
                mean_waste: mean(&values)?,
            })
        })
        .collect()
}

/// 依照護等級彙總；沒有住民資料的訂單不計入
pub fn consumption_by_care_level(
    meal_orders: &[MealOrder],
    residents: &[Resident],
) -> Vec<CareLevelConsumption> {
    let care_levels: HashMap<ResidentId, u8> = residents
        .iter()
        .map(|r| (r.resident_id, r.care_level))
        .collect();

    let mut groups: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
    for order in meal_orders {
        if let Some(level) = care_levels.get(&order.resident_id) {
            groups
                .entry(*level)
                .or_default()
                .push(order.actual_consumption);
        }
    }

    groups
        .into_iter()
        .filter_map(|(care_level, values)| {
            let mean_consumption = mean(&values)?;
            Some(CareLevelConsumption {
                care_level,
                mean_consumption,
                mean_waste: 1.0 - mean_consumption,
            })
        })
        .collect()
}

pub fn nutrition_report(meal_orders: &[MealOrder], residents: &[Resident]) -> NutritionReport {
    NutritionReport {
        by_meal_type: consumption_by_meal_type(meal_orders),
        waste_by_meal_type: waste_by_meal_type(meal_orders),
        by_care_level: consumption_by_care_level(meal_orders, residents),
        daily_waste: daily_waste(meal_orders),
    }
}

pub fn health_summary(records: &[HealthRecord]) -> Vec<DailyHealthSummary> {
    let mut groups: BTreeMap<NaiveDate, Vec<&HealthRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.date).or_default().push(record);
    }

    groups
        .into_iter()
        .filter_map(|(date, rows)| {
            let column = |pick: fn(&HealthRecord) -> f64| -> Vec<f64> {
                rows.iter().map(|r| pick(r)).collect()
            };
            let systolic = column(|r| r.blood_pressure_systolic);
            let heart_rate = column(|r| r.heart_rate);
            let weight = column(|r| r.weight);

            Some(DailyHealthSummary {
                date,
                systolic_mean: mean(&systolic)?,
                systolic_std: sample_std(&systolic),
                heart_rate_mean: mean(&heart_rate)?,
                heart_rate_std: sample_std(&heart_rate),
                weight_mean: mean(&weight)?,
                weight_std: sample_std(&weight),
            })
        })
        .collect()
}

pub fn resident_overview(residents: &[Resident]) -> Option<ResidentOverview> {
    let ages: Vec<f64> = residents.iter().map(|r| f64::from(r.age)).collect();
    let care_levels: Vec<f64> = residents.iter().map(|r| f64::from(r.care_level)).collect();

    let mut distribution: BTreeMap<u32, usize> = BTreeMap::new();
    for resident in residents {
        *distribution.entry(resident.age).or_default() += 1;
    }

    Some(ResidentOverview {
        resident_count: residents.len(),
        mean_age: mean(&ages)?,
        min_age: residents.iter().map(|r| r.age).min()?,
        max_age: residents.iter().map(|r| r.age).max()?,
        mean_care_level: mean(&care_levels)?,
        age_distribution: distribution.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn order(resident_id: i64, d: u32, meal_type: MealType, consumption: f64) -> MealOrder {
        MealOrder {
            resident_id,
            date: day(d),
            meal_type,
            actual_consumption: consumption,
        }
    }

    fn resident(resident_id: i64, age: u32, care_level: u8) -> Resident {
        Resident {
            resident_id,
            age,
            care_level,
            special_dietary_requirements: "none".to_string(),
        }
    }

    #[test]
    fn test_nutrition_report() {
        let orders = vec![
            order(1, 1, MealType::Lunch, 1.0),
            order(2, 1, MealType::Lunch, 0.5),
            order(1, 2, MealType::Breakfast, 0.25),
        ];
        let residents = vec![resident(1, 85, 3), resident(2, 90, 5)];
        let report = nutrition_report(&orders, &residents);

        assert_eq!(report.by_meal_type.len(), 2);
        assert_eq!(report.by_meal_type[0].meal_type, MealType::Breakfast);
        assert_eq!(report.by_meal_type[0].std_consumption, None);
        assert_eq!(report.by_meal_type[1].count, 2);
        assert!((report.by_meal_type[1].mean_consumption - 0.75).abs() < 1e-9);

        assert!((report.waste_by_meal_type[0].mean_waste - 0.75).abs() < 1e-9);
        assert_eq!(report.daily_waste.len(), 2);
        assert!((report.daily_waste[0].mean_waste - 0.25).abs() < 1e-9);

        assert_eq!(report.by_care_level.len(), 2);
        assert_eq!(report.by_care_level[0].care_level, 3);
        assert!((report.by_care_level[0].mean_consumption - 0.625).abs() < 1e-9);
        assert!((report.by_care_level[1].mean_waste - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_health_summary_per_day() {
        let record = |resident_id, d, systolic, heart_rate, weight| HealthRecord {
            resident_id,
            date: day(d),
            blood_pressure_systolic: systolic,
            heart_rate,
            weight,
        };
        let records = vec![
            record(1, 1, 120.0, 70.0, 60.0),
            record(2, 1, 140.0, 80.0, 80.0),
            record(1, 2, 130.0, 75.0, 61.0),
        ];

        let summary = health_summary(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].systolic_mean, 130.0);
        assert!((summary[0].systolic_std.unwrap() - 200f64.sqrt()).abs() < 1e-9);
        assert_eq!(summary[1].weight_std, None);
    }

    #[test]
    fn test_resident_overview() {
        assert!(resident_overview(&[]).is_none());

        let residents = vec![resident(1, 85, 2), resident(2, 90, 4), resident(3, 85, 3)];
        let overview = resident_overview(&residents).unwrap();
        assert_eq!(overview.resident_count, 3);
        assert_eq!(overview.min_age, 85);
        assert_eq!(overview.max_age, 90);
        assert!((overview.mean_care_level - 3.0).abs() < 1e-9);
        assert_eq!(overview.age_distribution, vec![(85, 2), (90, 1)]);
    }
}
