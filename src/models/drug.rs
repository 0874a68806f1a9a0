use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry for a branded or generic drug name. Shared reference
/// data, owned by no single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drug {
    pub id: Uuid,
    pub name: String,
}

/// Pharmacologically active compound underlying one or more drugs.
///
/// `smiles` is the cached canonical molecular representation, populated
/// lazily on first successful external resolution. Once set it is treated
/// as stable and never re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveIngredient {
    pub id: Uuid,
    pub name: String,
    pub smiles: Option<String>,
}

/// Substitute entry for a drug, with optional herbal alternatives
/// (comma-joined names). Unique on (drug, substitute).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugAlternative {
    pub id: Uuid,
    pub drug_id: Uuid,
    pub substitute: String,
    pub match_score: Option<f64>,
    pub drug_class: Option<String>,
    pub atc_code: Option<String>,
    pub herbal_alternatives: Option<String>,
}
