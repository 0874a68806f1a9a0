//! Drug-drug interaction detection pipeline.
//!
//! Three stages with graceful degradation at each:
//! 1. free-text drug name → active ingredient set (`resolver`)
//! 2. active ingredient → canonical molecular structure string, from the
//!    local cache or an external chemical-properties lookup (`resolver` +
//!    `pubchem`)
//! 3. structure pair → interaction probability (`scorer`) → risk tier
//!    (`severity`), walked across a patient's active medications
//!    (`aggregator`).

pub mod aggregator;
pub mod pubchem;
pub mod resolver;
pub mod scorer;
pub mod severity;

pub use aggregator::{check_interactions, InteractionReport, REPORT_THRESHOLD};
pub use pubchem::PubChemClient;
pub use resolver::{resolve_active_ingredients, resolve_single, resolve_structures, StructureSource};
pub use scorer::{DdiModel, InteractionScorer, LinearDdiModel, ScorerError};
pub use severity::{classify_severity, RiskTier};
