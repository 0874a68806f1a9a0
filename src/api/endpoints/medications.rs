//! Medication CRUD and dose-marking endpoints.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adherence;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db::repository::medication as med_repo;
use crate::ddi::{check_interactions, InteractionReport};
use crate::models::{DoseRecord, Medication};

#[derive(Serialize)]
pub struct MedicationsResponse {
    pub medications: Vec<Medication>,
}

/// `GET /api/medications` — the caller's unfinished medications, in
/// creation order.
pub async fn list(
    State(ctx): State<ApiContext>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MedicationsResponse>, ApiError> {
    let conn = ctx.db.lock().await;
    let medications = med_repo::list_unfinished(&conn, &user_id)?;
    Ok(Json(MedicationsResponse { medications }))
}

#[derive(Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub dosage: String,
    pub time: String,
    pub form: Option<String>,
    pub doses_per_day: Option<u32>,
    pub duration_days: Option<u32>,
}

#[derive(Serialize)]
pub struct CreateMedicationResponse {
    #[serde(flatten)]
    pub medication: Medication,
    pub severity_check: Vec<InteractionReport>,
}

#[derive(Serialize)]
pub struct DuplicateResponse {
    pub detail: &'static str,
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ApiError> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid time of day: {raw}")))?;
    // Sub-minute precision is not meaningful for a dosing schedule.
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid time of day: {raw}")))
}

/// `POST /api/medications` — create a medication and screen it against
/// the caller's other unfinished medications.
///
/// Re-creating an existing (user, name) pairing is an idempotent 200
/// no-op; a successful creation answers 201 with the record plus its
/// interaction reports.
pub async fn create(
    State(ctx): State<ApiContext>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateMedicationRequest>,
) -> Result<Response, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    let doses_per_day = req.doses_per_day.unwrap_or(1);
    let duration_days = req.duration_days.unwrap_or(7);
    if doses_per_day == 0 {
        return Err(ApiError::BadRequest("doses_per_day must be at least 1".into()));
    }
    if duration_days == 0 {
        return Err(ApiError::BadRequest("duration_days must be at least 1".into()));
    }
    let time_of_day = parse_time_of_day(&req.time)?;

    let today = chrono::Local::now().date_naive();
    let medication = Medication {
        id: Uuid::new_v4(),
        user_id,
        name: name.clone(),
        dosage: req.dosage,
        time_of_day,
        form: req.form.unwrap_or_else(|| "Tablet".to_string()),
        doses_per_day,
        duration_days,
        start_date: today,
        dose_record: DoseRecord::initial(doses_per_day, today),
        finished: false,
    };

    let existing = {
        let conn = ctx.db.lock().await;
        if med_repo::find_by_user_and_name(&conn, &user_id, &name)?.is_some() {
            let body = DuplicateResponse {
                detail: "Medication already exists for this user.",
            };
            return Ok((StatusCode::OK, Json(body)).into_response());
        }
        med_repo::insert_medication(&conn, &medication)?;
        med_repo::others_unfinished(&conn, &user_id, &medication.id)?
    };

    // Lock released: the screening walk re-acquires it per resolution and
    // may call out to the external lookup.
    let severity_check = check_interactions(
        &ctx.db,
        &ctx.pubchem,
        ctx.scorer.as_ref(),
        &name,
        &existing,
    )
    .await?;

    tracing::info!(
        medication = %name,
        reports = severity_check.len(),
        "Medication created"
    );
    let body = CreateMedicationResponse {
        medication,
        severity_check,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// `GET /api/medications/:id` — detail, owner only.
pub async fn detail(
    State(ctx): State<ApiContext>,
    AuthUser(user_id): AuthUser,
    Path(med_id): Path<Uuid>,
) -> Result<Json<Medication>, ApiError> {
    let conn = ctx.db.lock().await;
    med_repo::get_for_user(&conn, &user_id, &med_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Medication not found".into()))
}

/// `DELETE /api/medications/:id` — remove, owner only.
pub async fn remove(
    State(ctx): State<ApiContext>,
    AuthUser(user_id): AuthUser,
    Path(med_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.db.lock().await;
    if med_repo::delete_for_user(&conn, &user_id, &med_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Medication not found".into()))
    }
}

#[derive(Deserialize, Default)]
pub struct MarkTakenRequest {
    pub dose_number: Option<u32>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum MarkTakenResponse {
    Marked {
        message: String,
        date: NaiveDate,
        doses: BTreeMap<String, bool>,
    },
    Completed {
        message: String,
    },
}

/// `PATCH /api/medications/:id/taken` — mark one dose taken for today.
pub async fn mark_taken(
    State(ctx): State<ApiContext>,
    AuthUser(user_id): AuthUser,
    Path(med_id): Path<Uuid>,
    body: Option<Json<MarkTakenRequest>>,
) -> Result<Json<MarkTakenResponse>, ApiError> {
    let dose_number = body
        .and_then(|Json(req)| req.dose_number)
        .ok_or_else(|| ApiError::BadRequest("dose_number is required".into()))?;
    if dose_number == 0 {
        return Err(ApiError::BadRequest("dose_number must be at least 1".into()));
    }

    let today = chrono::Local::now().date_naive();
    let mut conn = ctx.db.lock().await;
    let (med, outcome) = adherence::mark_taken(&mut conn, &user_id, &med_id, dose_number, today)?;

    let response = match outcome {
        adherence::MarkOutcome::Marked { date, doses } => MarkTakenResponse::Marked {
            message: format!("{} dose {} marked as taken.", med.name, dose_number),
            date,
            doses,
        },
        adherence::MarkOutcome::Completed => MarkTakenResponse::Completed {
            message: format!("{} treatment completed.", med.name),
        },
    };
    Ok(Json(response))
}
