//! Dose adherence: marking doses taken and completing courses.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::repository::medication as med_repo;
use crate::db::DatabaseError;
use crate::models::Medication;

#[derive(Debug, thiserror::Error)]
pub enum AdherenceError {
    /// Medication missing or not owned by the caller — indistinguishable
    /// on purpose.
    #[error("medication not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What a mark-taken call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A dose slot was set; the course continues.
    Marked {
        date: NaiveDate,
        doses: BTreeMap<String, bool>,
    },
    /// This mark completed the course; the medication is now finished.
    Completed,
}

/// Mark one dose of a medication taken for `today` and evaluate course
/// completion, atomically.
///
/// Completion requires both that the course duration has elapsed
/// (`today >= start_date + duration_days - 1`) and that every slot in
/// every recorded day bucket is taken. Finished medications are terminal
/// and report `NotFound`.
pub fn mark_taken(
    conn: &mut Connection,
    user_id: &Uuid,
    med_id: &Uuid,
    dose_number: u32,
    today: NaiveDate,
) -> Result<(Medication, MarkOutcome), AdherenceError> {
    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let mut med = med_repo::get_for_user(&tx, user_id, med_id)?.ok_or(AdherenceError::NotFound)?;
    if med.finished {
        return Err(AdherenceError::NotFound);
    }

    med.dose_record.mark(today, dose_number);
    med_repo::update_dose_record(&tx, &med.id, &med.dose_record)?;

    let end_date = med.start_date + Duration::days(i64::from(med.duration_days) - 1);
    let outcome = if today >= end_date && med.dose_record.all_taken() {
        med_repo::set_finished(&tx, &med.id)?;
        med.finished = true;
        MarkOutcome::Completed
    } else {
        let doses = med
            .dose_record
            .bucket(today)
            .cloned()
            .unwrap_or_default();
        MarkOutcome::Marked { date: today, doses }
    };

    tx.commit().map_err(DatabaseError::from)?;
    tracing::debug!(
        medication = %med.name,
        dose = dose_number,
        completed = med.finished,
        "Dose marked"
    );
    Ok((med, outcome))
}
