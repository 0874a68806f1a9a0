//! Drug catalog seeding from the reference CSV.
//!
//! The CSV carries one row per (drug, substitute) pairing with the
//! drug's active ingredient list in a single free-text column, e.g.
//! `"Amoxycillin (500mg) + Clavulanic Acid (125mg)"`. Import is
//! idempotent: drugs and ingredients upsert by name, alternative rows
//! skip on duplicate.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::drug as drug_repo;
use crate::db::DatabaseError;
use crate::models::DrugAlternative;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog file: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog file is missing the {0} column")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Counts reported by one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: usize,
    pub alternatives_inserted: usize,
    pub alternatives_skipped: usize,
}

fn parens() -> &'static Regex {
    static PARENS: OnceLock<Regex> = OnceLock::new();
    PARENS.get_or_init(|| Regex::new(r"\([^)]*\)").expect("hard-coded pattern"))
}

/// Split a free-text ingredient list into normalized ingredient names:
/// lowercased, dosage parentheticals stripped, `+`-separated.
pub fn parse_active_ingredients(raw: &str) -> Vec<String> {
    let lowered = raw.to_lowercase();
    let cleaned = parens().replace_all(&lowered, "");
    cleaned
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

struct Columns {
    drug_name: usize,
    substitute: usize,
    ingredients: usize,
    atc_code: Option<usize>,
    match_score: Option<usize>,
    drug_class: Option<usize>,
    herbal_alternatives: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Ok(Self {
            drug_name: find("Drug_Name").ok_or(CatalogError::MissingColumn("Drug_Name"))?,
            substitute: find("substitute").ok_or(CatalogError::MissingColumn("substitute"))?,
            ingredients: find("Active_Ingredients")
                .or_else(|| find("Active_Ingredient"))
                .ok_or(CatalogError::MissingColumn("Active_Ingredients"))?,
            atc_code: find("ATC_Code"),
            match_score: find("Match_Score"),
            drug_class: find("Drug_Class"),
            herbal_alternatives: find("Herbal_Alternatives"),
        })
    }
}

fn non_empty(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    let value = record.get(index?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Import the catalog CSV at `path` into the drug tables.
pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportSummary, CatalogError> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = Columns::from_headers(reader.headers()?)?;

    let mut summary = ImportSummary::default();
    for record in reader.records() {
        let record = record?;
        let Some(drug_name) = non_empty(&record, Some(columns.drug_name)) else {
            continue;
        };
        summary.rows += 1;

        let drug_id = drug_repo::upsert_drug(conn, &drug_name.to_lowercase())?;

        if let Some(raw) = non_empty(&record, Some(columns.ingredients)) {
            for ingredient in parse_active_ingredients(&raw) {
                let ingredient_id = drug_repo::upsert_ingredient(conn, &ingredient)?;
                drug_repo::link_drug_ingredient(conn, &drug_id, &ingredient_id)?;
            }
        }

        if let Some(substitute) = non_empty(&record, Some(columns.substitute)) {
            let alt = DrugAlternative {
                id: Uuid::new_v4(),
                drug_id,
                substitute: substitute.to_lowercase(),
                match_score: non_empty(&record, columns.match_score)
                    .and_then(|s| s.parse().ok()),
                drug_class: non_empty(&record, columns.drug_class),
                atc_code: non_empty(&record, columns.atc_code),
                herbal_alternatives: non_empty(&record, columns.herbal_alternatives),
            };
            if drug_repo::insert_alternative(conn, &alt)? {
                summary.alternatives_inserted += 1;
            } else {
                summary.alternatives_skipped += 1;
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        rows = summary.rows,
        inserted = summary.alternatives_inserted,
        skipped = summary.alternatives_skipped,
        "Catalog import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use std::io::Write;

    const CSV_HEADER: &str =
        "Drug_Name,substitute,Active_Ingredients,ATC_Code,Match_Score,Drug_Class,Herbal_Alternatives\n";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV_HEADER.as_bytes()).unwrap();
        for row in rows {
            file.write_all(row.as_bytes()).unwrap();
            file.write_all(b"\n").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn parses_combination_with_dosage_parentheticals() {
        assert_eq!(
            parse_active_ingredients("Amoxycillin (500mg) + Clavulanic Acid (125mg)"),
            ["amoxycillin", "clavulanic acid"]
        );
    }

    #[test]
    fn parses_single_ingredient() {
        assert_eq!(parse_active_ingredients("Paracetamol (650mg)"), ["paracetamol"]);
        assert_eq!(parse_active_ingredients("Ibuprofen"), ["ibuprofen"]);
    }

    #[test]
    fn parse_drops_empty_parts() {
        assert!(parse_active_ingredients("").is_empty());
        assert!(parse_active_ingredients("(500mg)").is_empty());
        assert_eq!(parse_active_ingredients(" + Aspirin + "), ["aspirin"]);
    }

    #[test]
    fn import_links_drugs_ingredients_and_alternatives() {
        let conn = open_memory_database().unwrap();
        let file = write_csv(&[
            "Augmentin,Amoxiclav,Amoxycillin (500mg) + Clavulanic Acid (125mg),J01CR02,0.92,Penicillin,\"garlic, echinacea\"",
        ]);

        let summary = import_csv(&conn, file.path()).unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.alternatives_inserted, 1);

        let drug = drug_repo::find_drug_by_name(&conn, "augmentin").unwrap().unwrap();
        let ingredients = drug_repo::ingredients_for_drug(&conn, &drug.id).unwrap();
        let names: Vec<_> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["amoxycillin", "clavulanic acid"]);

        let alternatives = drug_repo::alternatives_for_drug(&conn, &drug.id).unwrap();
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].substitute, "amoxiclav");
        assert_eq!(alternatives[0].match_score, Some(0.92));
        assert_eq!(alternatives[0].atc_code.as_deref(), Some("J01CR02"));
        assert_eq!(
            alternatives[0].herbal_alternatives.as_deref(),
            Some("garlic, echinacea")
        );
    }

    #[test]
    fn reimport_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let file = write_csv(&["Augmentin,Amoxiclav,Amoxycillin,J01CR02,0.92,Penicillin,"]);

        import_csv(&conn, file.path()).unwrap();
        let second = import_csv(&conn, file.path()).unwrap();
        assert_eq!(second.alternatives_inserted, 0);
        assert_eq!(second.alternatives_skipped, 1);

        let drug = drug_repo::find_drug_by_name(&conn, "augmentin").unwrap().unwrap();
        assert_eq!(drug_repo::alternatives_for_drug(&conn, &drug.id).unwrap().len(), 1);
    }

    #[test]
    fn accepts_singular_ingredient_header() {
        let conn = open_memory_database().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Drug_Name,substitute,Active_Ingredient\nPanadol,Calpol,Paracetamol\n")
            .unwrap();
        file.flush().unwrap();

        import_csv(&conn, file.path()).unwrap();
        assert!(drug_repo::find_ingredient_by_name(&conn, "paracetamol").unwrap().is_some());
    }

    #[test]
    fn missing_required_column_is_reported() {
        let conn = open_memory_database().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Drug_Name,substitute\nPanadol,Calpol\n").unwrap();
        file.flush().unwrap();

        let result = import_csv(&conn, file.path());
        assert!(matches!(result, Err(CatalogError::MissingColumn("Active_Ingredients"))));
    }

    #[test]
    fn rows_without_drug_name_are_skipped() {
        let conn = open_memory_database().unwrap();
        let file = write_csv(&[",Orphan,Paracetamol,,,,", "Panadol,Calpol,Paracetamol,,,,"]);

        let summary = import_csv(&conn, file.path()).unwrap();
        assert_eq!(summary.rows, 1);
    }
}
