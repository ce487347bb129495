use crate::domain::model::{ActivityParticipation, Outing, ResidentCare, ResidentId};
use crate::domain::ports::{ActivityRepository, OutingRepository, ResidentCareRepository};
use crate::utils::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// In-memory repositories for fixtures and small batch runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCareStore {
    residents: BTreeMap<ResidentId, ResidentCare>,
    falls: Vec<(ResidentId, NaiveDate)>,
    activities: Vec<ActivityParticipation>,
    outings: Vec<Outing>,
}

impl InMemoryCareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resident(
        mut self,
        resident_id: ResidentId,
        mobility_status: Option<&str>,
        last_fall_date: Option<NaiveDate>,
    ) -> Self {
        self.add_resident(ResidentCare {
            resident_id,
            mobility_status: mobility_status.map(String::from),
            last_fall_date,
        });
        self
    }

    pub fn add_resident(&mut self, care: ResidentCare) {
        if let Some(date) = care.last_fall_date {
            self.falls.push((care.resident_id, date));
        }
        self.residents.insert(care.resident_id, care);
    }

    pub fn add_fall(&mut self, resident_id: ResidentId, date: NaiveDate) {
        self.falls.push((resident_id, date));
    }

    pub fn add_activity(&mut self, resident_id: ResidentId, date: NaiveDate) {
        self.activities.push(ActivityParticipation { resident_id, date });
    }

    pub fn add_outing(&mut self, resident_id: ResidentId, departure_time: NaiveDateTime) {
        self.outings.push(Outing {
            resident_id,
            departure_time,
        });
    }
}

impl ActivityRepository for InMemoryCareStore {
    fn participation_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, u32)>> {
        let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for activity in self
            .activities
            .iter()
            .filter(|a| a.resident_id == resident_id && a.date >= since)
        {
            *counts.entry(activity.date).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

impl OutingRepository for InMemoryCareStore {
    fn visit_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, u32)>> {
        let mut counts: BTreeMap<NaiveDateTime, u32> = BTreeMap::new();
        for outing in self
            .outings
            .iter()
            .filter(|o| o.resident_id == resident_id && o.departure_time >= since)
        {
            *counts.entry(outing.departure_time).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

impl ResidentCareRepository for InMemoryCareStore {
    fn resident_ids(&self) -> Result<Vec<ResidentId>> {
        Ok(self.residents.keys().copied().collect())
    }

    fn mobility_status(&self, resident_id: ResidentId) -> Result<Option<String>> {
        Ok(self
            .residents
            .get(&resident_id)
            .and_then(|care| care.mobility_status.clone()))
    }

    fn count_falls_since(&self, resident_id: ResidentId, since: NaiveDate) -> Result<u32> {
        let count = self
            .falls
            .iter()
            .filter(|(id, date)| *id == resident_id && *date >= since)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
