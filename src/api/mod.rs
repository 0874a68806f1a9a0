//! HTTP API layer.
//!
//! Routes live under `/api/` and share an [`ApiContext`]. The acting
//! user arrives as an `X-User-Id` header set by the upstream gateway;
//! everything identity-related beyond that is out of scope here.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use types::{ApiContext, AuthUser};
