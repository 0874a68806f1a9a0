//! Interaction screening across a patient's current medications.

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::DatabaseError;
use crate::ddi::pubchem::PubChemClient;
use crate::ddi::resolver::resolve_structures;
use crate::ddi::scorer::{round4, InteractionScorer, ScorerError};
use crate::ddi::severity::{classify_severity, RiskTier};
use crate::models::Medication;

/// Minimum probability at which a pairing is reported at all.
pub const REPORT_THRESHOLD: f64 = 0.70;

/// One reported interaction between the screened medication and an
/// existing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionReport {
    pub with: String,
    pub interaction_probability: f64,
    pub risk_level: RiskTier,
}

/// Screen a candidate medication against the given existing medications.
///
/// Per existing medication the score is the maximum over all structure
/// pairs (candidate ingredients × existing ingredients); only scores at
/// or above [`REPORT_THRESHOLD`] are reported. Medications whose
/// structures cannot be resolved are skipped silently. If the scorer
/// reports itself unavailable the walk stops and whatever was gathered
/// so far is returned.
pub async fn check_interactions(
    db: &Mutex<Connection>,
    pubchem: &PubChemClient,
    scorer: &dyn InteractionScorer,
    candidate_name: &str,
    existing: &[Medication],
) -> Result<Vec<InteractionReport>, DatabaseError> {
    let candidate_structures = resolve_structures(db, pubchem, candidate_name).await?;
    if candidate_structures.is_empty() {
        tracing::debug!(medication = candidate_name, "Candidate has no resolvable structures");
        return Ok(Vec::new());
    }

    let mut reports = Vec::new();
    'walk: for med in existing {
        let other_structures = resolve_structures(db, pubchem, &med.name).await?;
        if other_structures.is_empty() {
            continue;
        }

        let mut max_probability = 0.0_f64;
        for a in &candidate_structures {
            for b in &other_structures {
                match scorer.score(a, b) {
                    Ok(p) => max_probability = max_probability.max(p),
                    Err(ScorerError::ModelUnavailable) => {
                        tracing::warn!(
                            medication = candidate_name,
                            against = %med.name,
                            "Interaction model unavailable; returning partial results"
                        );
                        break 'walk;
                    }
                }
            }
        }

        if max_probability >= REPORT_THRESHOLD {
            let probability = round4(max_probability);
            reports.push(InteractionReport {
                with: med.name.clone(),
                interaction_probability: probability,
                risk_level: classify_severity(probability),
            });
        }
    }

    Ok(reports)
}
