//! Direct pairwise interaction query.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::ddi::resolver::resolve_single;
use crate::ddi::severity::classify_severity;
use crate::ddi::{RiskTier, StructureSource};

#[derive(Deserialize)]
pub struct InteractionRequest {
    pub drug_a: String,
    pub drug_b: String,
}

#[derive(Serialize)]
pub struct SourceInfo {
    pub drug_a: StructureSource,
    pub drug_b: StructureSource,
}

#[derive(Serialize)]
pub struct InteractionResponse {
    pub drug_a: String,
    pub drug_b: String,
    pub interaction_probability: f64,
    pub risk_level: RiskTier,
    pub source: SourceInfo,
}

/// `POST /api/interactions` — score one explicit drug pair.
///
/// Both sides must resolve to a structure before the scorer is invoked;
/// an unresolvable side is a 400, an unloaded model a 503.
pub async fn check(
    State(ctx): State<ApiContext>,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<InteractionRequest>,
) -> Result<Json<InteractionResponse>, ApiError> {
    let drug_a = req.drug_a.trim().to_string();
    let drug_b = req.drug_b.trim().to_string();
    if drug_a.is_empty() || drug_b.is_empty() {
        return Err(ApiError::BadRequest("drug_a and drug_b are required".into()));
    }

    let (repr_a, source_a) = resolve_single(&ctx.db, &ctx.pubchem, &drug_a)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Could not resolve a structure for '{drug_a}'"))
        })?;
    let (repr_b, source_b) = resolve_single(&ctx.db, &ctx.pubchem, &drug_b)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Could not resolve a structure for '{drug_b}'"))
        })?;

    let probability = ctx.scorer.score(&repr_a, &repr_b)?;
    Ok(Json(InteractionResponse {
        drug_a,
        drug_b,
        interaction_probability: probability,
        risk_level: classify_severity(probability),
        source: SourceInfo {
            drug_a: source_a,
            drug_b: source_b,
        },
    }))
}
