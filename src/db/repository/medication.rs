use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{DoseRecord, Medication};

const MEDICATION_COLUMNS: &str = "id, user_id, name, dosage, time_of_day, form, doses_per_day,
     duration_days, start_date, dose_record, finished";

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, user_id, name, dosage, time_of_day, form, doses_per_day,
         duration_days, start_date, dose_record, finished)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            med.id.to_string(),
            med.user_id.to_string(),
            med.name,
            med.dosage,
            med.time_of_day.format("%H:%M:%S").to_string(),
            med.form,
            med.doses_per_day,
            med.duration_days,
            med.start_date.to_string(),
            med.dose_record.to_json(),
            med.finished as i32,
        ],
    )?;
    Ok(())
}

/// Case-insensitive (user, name) lookup — the duplicate-creation guard.
pub fn find_by_user_and_name(
    conn: &Connection,
    user_id: &Uuid,
    name: &str,
) -> Result<Option<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE"
    );
    query_single(conn, &sql, params![user_id.to_string(), name])
}

pub fn get_for_user(
    conn: &Connection,
    user_id: &Uuid,
    med_id: &Uuid,
) -> Result<Option<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1 AND user_id = ?2"
    );
    query_single(conn, &sql, params![med_id.to_string(), user_id.to_string()])
}

/// A user's unfinished medications, in creation order.
pub fn list_unfinished(conn: &Connection, user_id: &Uuid) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE user_id = ?1 AND finished = 0
         ORDER BY rowid ASC"
    );
    query_many(conn, &sql, params![user_id.to_string()])
}

/// A user's other unfinished medications, excluding one id — the
/// counterpart set for the interaction walk. Creation order is preserved
/// so interaction reports come back in a stable order.
pub fn others_unfinished(
    conn: &Connection,
    user_id: &Uuid,
    exclude: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE user_id = ?1 AND id != ?2 AND finished = 0
         ORDER BY rowid ASC"
    );
    query_many(conn, &sql, params![user_id.to_string(), exclude.to_string()])
}

pub fn update_dose_record(
    conn: &Connection,
    med_id: &Uuid,
    record: &DoseRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE medications SET dose_record = ?1 WHERE id = ?2",
        params![record.to_json(), med_id.to_string()],
    )?;
    Ok(())
}

/// The single false→true transition. Never unset.
pub fn set_finished(conn: &Connection, med_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE medications SET finished = 1 WHERE id = ?1",
        params![med_id.to_string()],
    )?;
    Ok(())
}

/// Delete a medication owned by the caller. Returns false when no row
/// matched (missing or not owned).
pub fn delete_for_user(
    conn: &Connection,
    user_id: &Uuid,
    med_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM medications WHERE id = ?1 AND user_id = ?2",
        params![med_id.to_string(), user_id.to_string()],
    )?;
    Ok(affected > 0)
}

// ── Row mapping ─────────────────────────────────────────────

struct MedicationRow {
    id: String,
    user_id: String,
    name: String,
    dosage: String,
    time_of_day: String,
    form: String,
    doses_per_day: u32,
    duration_days: u32,
    start_date: String,
    dose_record: String,
    finished: i32,
}

fn row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        time_of_day: row.get(4)?,
        form: row.get(5)?,
        doses_per_day: row.get(6)?,
        duration_days: row.get(7)?,
        start_date: row.get(8)?,
        dose_record: row.get(9)?,
        finished: row.get(10)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        dosage: row.dosage,
        time_of_day: NaiveTime::parse_from_str(&row.time_of_day, "%H:%M:%S")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        form: row.form,
        doses_per_day: row.doses_per_day,
        duration_days: row.duration_days,
        start_date: NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        dose_record: DoseRecord::parse(&row.dose_record)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        finished: row.finished != 0,
    })
}

fn query_single(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<Medication>, DatabaseError> {
    match conn.query_row(sql, params, |row| Ok(row_from_rusqlite(row))) {
        Ok(row) => Ok(Some(medication_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

fn query_many(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(row_from_rusqlite(row)))?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row??)?);
    }
    Ok(meds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_medication(user_id: Uuid, name: &str) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            dosage: "500mg".into(),
            time_of_day: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            form: "Tablet".into(),
            doses_per_day: 2,
            duration_days: 7,
            start_date: "2026-03-01".parse().unwrap(),
            dose_record: DoseRecord::initial(2, "2026-03-01".parse().unwrap()),
            finished: false,
        }
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let med = test_medication(user, "Panadol");
        insert_medication(&conn, &med).unwrap();

        let fetched = get_for_user(&conn, &user, &med.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Panadol");
        assert_eq!(fetched.doses_per_day, 2);
        assert_eq!(fetched.dose_record, med.dose_record);
        assert!(!fetched.finished);
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        insert_medication(&conn, &test_medication(user, "Panadol")).unwrap();

        assert!(find_by_user_and_name(&conn, &user, "PANADOL").unwrap().is_some());
        assert!(find_by_user_and_name(&conn, &user, "panadol").unwrap().is_some());
        assert!(find_by_user_and_name(&conn, &user, "Aspirin").unwrap().is_none());
    }

    #[test]
    fn duplicate_name_rejected_by_unique_index() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        insert_medication(&conn, &test_medication(user, "Panadol")).unwrap();
        let result = insert_medication(&conn, &test_medication(user, "panadol"));
        assert!(result.is_err());
    }

    #[test]
    fn same_name_allowed_for_different_users() {
        let conn = open_memory_database().unwrap();
        insert_medication(&conn, &test_medication(Uuid::new_v4(), "Panadol")).unwrap();
        insert_medication(&conn, &test_medication(Uuid::new_v4(), "Panadol")).unwrap();
    }

    #[test]
    fn list_unfinished_preserves_creation_order() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        for name in ["First", "Second", "Third"] {
            insert_medication(&conn, &test_medication(user, name)).unwrap();
        }

        let meds = list_unfinished(&conn, &user).unwrap();
        let names: Vec<_> = meds.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn list_unfinished_excludes_finished() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let med = test_medication(user, "Done");
        insert_medication(&conn, &med).unwrap();
        insert_medication(&conn, &test_medication(user, "Ongoing")).unwrap();
        set_finished(&conn, &med.id).unwrap();

        let meds = list_unfinished(&conn, &user).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Ongoing");
    }

    #[test]
    fn others_unfinished_excludes_given_id() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let med_a = test_medication(user, "A");
        insert_medication(&conn, &med_a).unwrap();
        insert_medication(&conn, &test_medication(user, "B")).unwrap();

        let others = others_unfinished(&conn, &user, &med_a.id).unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].name, "B");
    }

    #[test]
    fn update_dose_record_persists() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let mut med = test_medication(user, "Panadol");
        insert_medication(&conn, &med).unwrap();

        med.dose_record.mark("2026-03-01".parse().unwrap(), 1);
        update_dose_record(&conn, &med.id, &med.dose_record).unwrap();

        let fetched = get_for_user(&conn, &user, &med.id).unwrap().unwrap();
        assert_eq!(
            fetched.dose_record.bucket("2026-03-01".parse().unwrap()).unwrap().get("dose-1"),
            Some(&true)
        );
    }

    #[test]
    fn delete_requires_ownership() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let med = test_medication(user, "Panadol");
        insert_medication(&conn, &med).unwrap();

        assert!(!delete_for_user(&conn, &Uuid::new_v4(), &med.id).unwrap());
        assert!(delete_for_user(&conn, &user, &med.id).unwrap());
        assert!(get_for_user(&conn, &user, &med.id).unwrap().is_none());
    }

    #[test]
    fn get_for_user_hides_other_owners() {
        let conn = open_memory_database().unwrap();
        let med = test_medication(Uuid::new_v4(), "Panadol");
        insert_medication(&conn, &med).unwrap();
        assert!(get_for_user(&conn, &Uuid::new_v4(), &med.id).unwrap().is_none());
    }

    #[test]
    fn legacy_scalar_dose_record_normalized_on_read() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        let med = test_medication(user, "Old");
        insert_medication(&conn, &med).unwrap();
        conn.execute(
            "UPDATE medications SET dose_record = '{\"2025-11-04\": true}' WHERE id = ?1",
            params![med.id.to_string()],
        )
        .unwrap();

        let fetched = get_for_user(&conn, &user, &med.id).unwrap().unwrap();
        assert_eq!(
            fetched.dose_record.bucket("2025-11-04".parse().unwrap()).unwrap().get("dose-1"),
            Some(&true)
        );
    }
}
