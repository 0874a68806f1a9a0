//! Shared types for the API layer.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rusqlite::Connection;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::ddi::{InteractionScorer, PubChemClient};

/// Shared context for all API routes: the database handle, the
/// interaction scorer, and the external structure lookup client.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub scorer: Arc<dyn InteractionScorer>,
    pub pubchem: Arc<PubChemClient>,
    /// Snapshot of the scorer state at startup, reported by the health
    /// endpoint.
    pub model_loaded: bool,
}

impl ApiContext {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        scorer: Arc<dyn InteractionScorer>,
        pubchem: Arc<PubChemClient>,
        model_loaded: bool,
    ) -> Self {
        Self {
            db,
            scorer,
            pubchem,
            model_loaded,
        }
    }
}

/// Acting user, supplied by the upstream gateway as an `X-User-Id`
/// header. Absent or malformed → 401; no session logic lives here.
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let user_id = Uuid::parse_str(raw).map_err(|_| ApiError::Unauthorized)?;
        Ok(Self(user_id))
    }
}
