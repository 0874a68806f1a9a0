//! Drug substitute and herbal alternative lookups.

use axum::extract::{Query, State};
use axum::Json;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db::repository::drug as drug_repo;
use crate::db::DatabaseError;
use crate::models::{Drug, DrugAlternative};

#[derive(Deserialize)]
pub struct DrugQuery {
    pub name: Option<String>,
    pub id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct AlternativesResponse {
    pub drug: Option<String>,
    pub alternatives: Vec<DrugAlternative>,
}

fn lookup_exact(conn: &Connection, query: &DrugQuery) -> Result<Option<Drug>, DatabaseError> {
    match (&query.id, &query.name) {
        (Some(id), _) => drug_repo::find_drug_by_id(conn, id),
        (None, Some(name)) => drug_repo::find_drug_by_name(conn, name),
        (None, None) => Ok(None),
    }
}

/// `GET /api/drugs/alternatives?name=|id=` — substitutes for a drug.
/// Unknown drugs answer an empty list rather than an error.
pub async fn list(
    State(ctx): State<ApiContext>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<DrugQuery>,
) -> Result<Json<AlternativesResponse>, ApiError> {
    if query.id.is_none() && query.name.is_none() {
        return Err(ApiError::BadRequest("name or id is required".into()));
    }

    let conn = ctx.db.lock().await;
    let Some(drug) = lookup_exact(&conn, &query)? else {
        return Ok(Json(AlternativesResponse {
            drug: None,
            alternatives: Vec::new(),
        }));
    };
    let alternatives = drug_repo::alternatives_for_drug(&conn, &drug.id)?;
    Ok(Json(AlternativesResponse {
        drug: Some(drug.name),
        alternatives,
    }))
}

#[derive(Serialize)]
pub struct HerbsResponse {
    pub drug: String,
    pub herbs: Vec<String>,
}

/// `GET /api/drugs/alternatives/herbs?name=|id=` — deduplicated, sorted
/// herbal alternative names across a drug's substitute rows. Name match
/// is a case-insensitive substring here; an unknown drug is a 404.
pub async fn herbs(
    State(ctx): State<ApiContext>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<DrugQuery>,
) -> Result<Json<HerbsResponse>, ApiError> {
    if query.id.is_none() && query.name.is_none() {
        return Err(ApiError::BadRequest("name or id is required".into()));
    }

    let conn = ctx.db.lock().await;
    let drug = match (&query.id, &query.name) {
        (Some(id), _) => drug_repo::find_drug_by_id(&conn, id)?,
        (None, Some(name)) => drug_repo::find_drug_by_name_contains(&conn, name)?,
        (None, None) => None,
    }
    .ok_or_else(|| ApiError::NotFound("Drug not found".into()))?;

    let alternatives = drug_repo::alternatives_for_drug(&conn, &drug.id)?;
    let mut herbs: Vec<String> = alternatives
        .iter()
        .filter_map(|alt| alt.herbal_alternatives.as_deref())
        .flat_map(|joined| joined.split(','))
        .map(|herb| herb.trim().to_lowercase())
        .filter(|herb| !herb.is_empty())
        .collect();
    herbs.sort();
    herbs.dedup();

    Ok(Json(HerbsResponse {
        drug: drug.name,
        herbs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::api_router;
    use crate::api::types::testing::test_context;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-user-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_alternatives(ctx: &ApiContext) -> Uuid {
        let conn = ctx.db.lock().await;
        let drug = drug_repo::upsert_drug(&conn, "augmentin").unwrap();
        for (substitute, herbs) in [
            ("amoxiclav", Some("Garlic, Echinacea")),
            ("clavam", Some("echinacea, honey")),
            ("moxikind", None),
        ] {
            drug_repo::insert_alternative(
                &conn,
                &DrugAlternative {
                    id: Uuid::new_v4(),
                    drug_id: drug,
                    substitute: substitute.into(),
                    match_score: Some(0.9),
                    drug_class: Some("penicillin".into()),
                    atc_code: None,
                    herbal_alternatives: herbs.map(str::to_string),
                },
            )
            .unwrap();
        }
        drug
    }

    #[tokio::test]
    async fn alternatives_by_name_lists_substitutes() {
        let ctx = test_context(0.0);
        seed_alternatives(&ctx).await;
        let app = api_router(ctx);

        let response = app
            .oneshot(get("/api/drugs/alternatives?name=Augmentin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["drug"], "augmentin");
        let subs: Vec<_> = json["alternatives"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["substitute"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(subs, ["amoxiclav", "clavam", "moxikind"]);
    }

    #[tokio::test]
    async fn alternatives_by_id_works() {
        let ctx = test_context(0.0);
        let drug_id = seed_alternatives(&ctx).await;
        let app = api_router(ctx);

        let response = app
            .oneshot(get(&format!("/api/drugs/alternatives?id={drug_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["alternatives"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_drug_lists_empty() {
        let app = api_router(test_context(0.0));
        let response = app
            .oneshot(get("/api/drugs/alternatives?name=unobtainium"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["alternatives"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_query_is_400() {
        let app = api_router(test_context(0.0));
        let response = app.oneshot(get("/api/drugs/alternatives")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn herbs_are_deduplicated_and_sorted() {
        let ctx = test_context(0.0);
        seed_alternatives(&ctx).await;
        let app = api_router(ctx);

        // Substring match: "augment" finds "augmentin".
        let response = app
            .oneshot(get("/api/drugs/alternatives/herbs?name=augment"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["drug"], "augmentin");
        let herbs: Vec<_> = json["herbs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h.as_str().unwrap().to_string())
            .collect();
        assert_eq!(herbs, ["echinacea", "garlic", "honey"]);
    }

    #[tokio::test]
    async fn herbs_for_unknown_drug_is_404() {
        let app = api_router(test_context(0.0));
        let response = app
            .oneshot(get("/api/drugs/alternatives/herbs?name=unobtainium"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
