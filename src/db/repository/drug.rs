use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{ActiveIngredient, Drug, DrugAlternative};

pub fn find_drug_by_name(conn: &Connection, name: &str) -> Result<Option<Drug>, DatabaseError> {
    conn.query_row(
        "SELECT id, name FROM drugs WHERE name = ?1 COLLATE NOCASE",
        params![name],
        |row| {
            Ok(Drug {
                id: row.get::<_, String>(0)?.parse().unwrap_or_else(|_| Uuid::nil()),
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Substring drug lookup, case-insensitive. Used by the herbal
/// alternatives route only.
pub fn find_drug_by_name_contains(
    conn: &Connection,
    name: &str,
) -> Result<Option<Drug>, DatabaseError> {
    let pattern = format!("%{name}%");
    conn.query_row(
        "SELECT id, name FROM drugs WHERE name LIKE ?1 COLLATE NOCASE ORDER BY name ASC LIMIT 1",
        params![pattern],
        |row| {
            Ok(Drug {
                id: row.get::<_, String>(0)?.parse().unwrap_or_else(|_| Uuid::nil()),
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn find_drug_by_id(conn: &Connection, id: &Uuid) -> Result<Option<Drug>, DatabaseError> {
    conn.query_row(
        "SELECT id, name FROM drugs WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(Drug {
                id: row.get::<_, String>(0)?.parse().unwrap_or_else(|_| Uuid::nil()),
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn ingredients_for_drug(
    conn: &Connection,
    drug_id: &Uuid,
) -> Result<Vec<ActiveIngredient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT ai.id, ai.name, ai.smiles
         FROM active_ingredients ai
         INNER JOIN drug_ingredients di ON di.ingredient_id = ai.id
         WHERE di.drug_id = ?1
         ORDER BY ai.name ASC",
    )?;
    let rows = stmt
        .query_map(params![drug_id.to_string()], ingredient_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_ingredient_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<ActiveIngredient>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, smiles FROM active_ingredients WHERE name = ?1 COLLATE NOCASE",
        params![name],
        ingredient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Best-effort cache write: populate the molecular representation of an
/// ingredient that had none. An already-populated value is left alone, so
/// two racing resolutions cannot clobber each other with different data.
pub fn cache_ingredient_smiles(
    conn: &Connection,
    ingredient_id: &Uuid,
    smiles: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE active_ingredients SET smiles = ?1 WHERE id = ?2 AND smiles IS NULL",
        params![smiles, ingredient_id.to_string()],
    )?;
    Ok(())
}

pub fn upsert_drug(conn: &Connection, name: &str) -> Result<Uuid, DatabaseError> {
    if let Some(existing) = find_drug_by_name(conn, name)? {
        return Ok(existing.id);
    }
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO drugs (id, name) VALUES (?1, ?2)",
        params![id.to_string(), name],
    )?;
    Ok(id)
}

pub fn upsert_ingredient(conn: &Connection, name: &str) -> Result<Uuid, DatabaseError> {
    if let Some(existing) = find_ingredient_by_name(conn, name)? {
        return Ok(existing.id);
    }
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO active_ingredients (id, name, smiles) VALUES (?1, ?2, NULL)",
        params![id.to_string(), name],
    )?;
    Ok(id)
}

pub fn link_drug_ingredient(
    conn: &Connection,
    drug_id: &Uuid,
    ingredient_id: &Uuid,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO drug_ingredients (drug_id, ingredient_id) VALUES (?1, ?2)",
        params![drug_id.to_string(), ingredient_id.to_string()],
    )?;
    Ok(())
}

/// Skip-on-duplicate insert keyed on (drug, substitute).
pub fn insert_alternative(
    conn: &Connection,
    alt: &DrugAlternative,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO drug_alternatives
         (id, drug_id, substitute, match_score, drug_class, atc_code, herbal_alternatives)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            alt.id.to_string(),
            alt.drug_id.to_string(),
            alt.substitute,
            alt.match_score,
            alt.drug_class,
            alt.atc_code,
            alt.herbal_alternatives,
        ],
    )?;
    Ok(affected > 0)
}

pub fn alternatives_for_drug(
    conn: &Connection,
    drug_id: &Uuid,
) -> Result<Vec<DrugAlternative>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, drug_id, substitute, match_score, drug_class, atc_code, herbal_alternatives
         FROM drug_alternatives WHERE drug_id = ?1 ORDER BY substitute ASC",
    )?;
    let rows = stmt
        .query_map(params![drug_id.to_string()], |row| {
            Ok(DrugAlternative {
                id: row.get::<_, String>(0)?.parse().unwrap_or_else(|_| Uuid::nil()),
                drug_id: row.get::<_, String>(1)?.parse().unwrap_or_else(|_| Uuid::nil()),
                substitute: row.get(2)?,
                match_score: row.get(3)?,
                drug_class: row.get(4)?,
                atc_code: row.get(5)?,
                herbal_alternatives: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ingredient_from_row(row: &rusqlite::Row<'_>) -> Result<ActiveIngredient, rusqlite::Error> {
    Ok(ActiveIngredient {
        id: row.get::<_, String>(0)?.parse().unwrap_or_else(|_| Uuid::nil()),
        name: row.get(1)?,
        smiles: row.get(2)?,
    })
}
