//! Name-to-structure resolution.
//!
//! A free-text medication name resolves to zero or more canonical
//! molecular structure strings. Resolution prefers the local catalog
//! (drug → linked active ingredients → cached structures) and only goes
//! to the external lookup for ingredients with no cached structure,
//! persisting whatever it fetches so the next resolution is local.

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::repository::drug as drug_repo;
use crate::db::DatabaseError;
use crate::ddi::pubchem::PubChemClient;
use crate::models::ActiveIngredient;

/// Where a resolved structure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureSource {
    Cache,
    Pubchem,
}

/// Resolve a medication name to its active ingredient records.
///
/// A known drug name wins even when it has no linked ingredients; a name
/// that is itself an ingredient resolves to that single ingredient.
/// Unknown names resolve to an empty set, not an error.
pub fn resolve_active_ingredients(
    conn: &Connection,
    name: &str,
) -> Result<Vec<ActiveIngredient>, DatabaseError> {
    if let Some(drug) = drug_repo::find_drug_by_name(conn, name)? {
        return drug_repo::ingredients_for_drug(conn, &drug.id);
    }
    if let Some(ingredient) = drug_repo::find_ingredient_by_name(conn, name)? {
        return Ok(vec![ingredient]);
    }
    Ok(Vec::new())
}

/// Resolve a medication name to every structure string we can find for
/// it, tagged with provenance.
///
/// The database lock is held only for the catalog phases, never across
/// the external lookups. Fetched structures are written back to the
/// ingredient cache best-effort; a failed cache write is logged and the
/// structure is still used for this resolution.
async fn resolve_tagged(
    db: &Mutex<Connection>,
    pubchem: &PubChemClient,
    name: &str,
) -> Result<Vec<(String, StructureSource)>, DatabaseError> {
    let (mut structures, missing) = {
        let conn = db.lock().await;
        let ingredients = resolve_active_ingredients(&conn, name)?;

        let mut structures = Vec::new();
        let mut missing = Vec::new();
        for ingredient in ingredients {
            match ingredient.smiles {
                Some(smiles) => structures.push((smiles, StructureSource::Cache)),
                None => missing.push(ingredient),
            }
        }
        (structures, missing)
    };

    for ingredient in missing {
        let Some(smiles) = pubchem.canonical_smiles(&ingredient.name).await else {
            tracing::debug!(ingredient = %ingredient.name, "No structure found for ingredient");
            continue;
        };
        {
            let conn = db.lock().await;
            if let Err(e) = drug_repo::cache_ingredient_smiles(&conn, &ingredient.id, &smiles) {
                tracing::warn!(
                    ingredient = %ingredient.name,
                    error = %e,
                    "Failed to cache fetched structure"
                );
            }
        }
        structures.push((smiles, StructureSource::Pubchem));
    }

    // Name unknown to the catalog, or known but structureless: try the
    // medication name itself as a compound name.
    if structures.is_empty() {
        if let Some(smiles) = pubchem.canonical_smiles(name).await {
            structures.push((smiles, StructureSource::Pubchem));
        }
    }

    Ok(structures)
}

/// Resolve a medication name to its structure set.
pub async fn resolve_structures(
    db: &Mutex<Connection>,
    pubchem: &PubChemClient,
    name: &str,
) -> Result<Vec<String>, DatabaseError> {
    let tagged = resolve_tagged(db, pubchem, name).await?;
    Ok(tagged.into_iter().map(|(smiles, _)| smiles).collect())
}

/// Resolve a medication name to one representative structure and its
/// provenance. Cached structures sort ahead of fetched ones by
/// construction.
pub async fn resolve_single(
    db: &Mutex<Connection>,
    pubchem: &PubChemClient,
    name: &str,
) -> Result<Option<(String, StructureSource)>, DatabaseError> {
    let tagged = resolve_tagged(db, pubchem, name).await?;
    Ok(tagged.into_iter().next())
}
