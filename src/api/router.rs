//! HTTP router. All routes are nested under `/api/` and share one
//! `ApiContext` via `State`.

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/medications",
            get(endpoints::medications::list).post(endpoints::medications::create),
        )
        .route(
            "/medications/:id",
            get(endpoints::medications::detail).delete(endpoints::medications::remove),
        )
        .route("/medications/:id/taken", patch(endpoints::medications::mark_taken))
        .route("/interactions", post(endpoints::interactions::check))
        .route("/drugs/alternatives", get(endpoints::alternatives::list))
        .route("/drugs/alternatives/herbs", get(endpoints::alternatives::herbs))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::testing::test_context;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_does_not_require_identity() {
        let app = api_router(test_context(0.0));
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = api_router(test_context(0.0));
        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_user_header_is_401() {
        let app = api_router(test_context(0.0));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/medications")
                    .header("x-user-id", "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
