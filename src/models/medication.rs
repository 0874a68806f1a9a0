use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One tracked course of medication, owned by exactly one user.
#[derive(Debug, Clone, Serialize)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub time_of_day: NaiveTime,
    pub form: String,
    pub doses_per_day: u32,
    pub duration_days: u32,
    pub start_date: NaiveDate,
    pub dose_record: DoseRecord,
    pub finished: bool,
}

/// Slot identifier for the n-th scheduled dose of a day ("dose-1"..).
pub fn dose_slot(n: u32) -> String {
    format!("dose-{n}")
}

/// Per-day dose completion record: date → slot → taken.
///
/// Sparse — buckets and slots appear lazily when a dose is marked, except
/// for the day-of-creation bucket which is pre-populated with every slot
/// false. A slot set true is never reset by normal operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DoseRecord(pub BTreeMap<NaiveDate, BTreeMap<String, bool>>);

impl DoseRecord {
    /// Record for a freshly created medication: today's bucket with all
    /// slots present and untaken.
    pub fn initial(doses_per_day: u32, today: NaiveDate) -> Self {
        let bucket = (1..=doses_per_day.max(1))
            .map(|n| (dose_slot(n), false))
            .collect();
        Self(BTreeMap::from([(today, bucket)]))
    }

    /// Mark one slot taken, creating the day bucket if absent.
    /// Idempotent: re-marking a taken slot leaves the record unchanged.
    pub fn mark(&mut self, date: NaiveDate, dose_number: u32) {
        self.0.entry(date).or_default().insert(dose_slot(dose_number), true);
    }

    /// True when every slot across every bucket currently present is
    /// taken. Days with no bucket at all are not examined.
    pub fn all_taken(&self) -> bool {
        self.0.values().flat_map(|day| day.values()).all(|taken| *taken)
    }

    pub fn bucket(&self, date: NaiveDate) -> Option<&BTreeMap<String, bool>> {
        self.0.get(&date)
    }

    /// Parse the stored JSON column.
    ///
    /// Older records mapped a date directly to a single boolean instead of
    /// a slot map; those are normalized to `{"dose-1": bool}` here, at
    /// read time, so the rest of the code sees one schema only.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        let mut days = BTreeMap::new();

        let Value::Object(map) = value else {
            return Ok(Self::default());
        };
        for (key, day) in map {
            let Ok(date) = key.parse::<NaiveDate>() else {
                continue;
            };
            let bucket = match day {
                Value::Bool(taken) => BTreeMap::from([(dose_slot(1), taken)]),
                Value::Object(slots) => slots
                    .into_iter()
                    .map(|(slot, v)| (slot, v.as_bool().unwrap_or(false)))
                    .collect(),
                _ => continue,
            };
            days.insert(date, bucket);
        }
        Ok(Self(days))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
