//! Prospection endpoints under `/api/prospection`

use crate::extract::{self, ApiJson};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ccrm_common::models::{NewCallLog, NewProspect, Prospect};
use ccrm_common::time;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct ProspectListResponse {
    pub success: bool,
    pub prospects: Vec<Prospect>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProspectResponse {
    pub success: bool,
    pub prospect: Prospect,
}

/// GET /api/prospection/all
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Json<ProspectListResponse>> {
    let prospects = state.prospection().list_all().await?;
    Ok(Json(ProspectListResponse {
        success: true,
        count: prospects.len(),
        prospects,
    }))
}

/// POST /api/prospection
pub async fn create_prospect(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewProspect>,
) -> ApiResult<(StatusCode, Json<ProspectResponse>)> {
    let prospect = state.prospection().create(input, time::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProspectResponse {
            success: true,
            prospect,
        }),
    ))
}

/// GET /api/prospection/:id
pub async fn get_prospect(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProspectResponse>> {
    let prospect = state.prospection().get(&id).await?;
    Ok(Json(ProspectResponse {
        success: true,
        prospect,
    }))
}

/// PUT /api/prospection/:id
pub async fn update_prospect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ProspectResponse>> {
    let updates = extract::body_object(&body)?;
    let prospect = state.prospection().update(&id, updates, time::now()).await?;
    Ok(Json(ProspectResponse {
        success: true,
        prospect,
    }))
}

/// DELETE /api/prospection/:id
pub async fn delete_prospect(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.prospection().delete(&id).await?;
    Ok(Json(json!({ "success": true, "deleted": id })))
}

/// POST /api/prospection/bulk-delete
///
/// **Request:** `{"prospectIds": [...]}`
/// **Response:** `{"success": true, "deletedCount": n, "failures": [{id, error}]}`
pub async fn bulk_delete(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    let ids = extract::id_list(&body, "prospectIds")?;
    let outcome = state.prospection().bulk_delete(&ids).await?;
    Ok(Json(json!({
        "success": true,
        "deletedCount": outcome.succeeded_count(),
        "failures": outcome.failed,
    })))
}

/// POST /api/prospection/import
///
/// **Request:** `{"prospects": [...], "date": "YYYY-MM-DD"}`; `date`
/// defaults to today.
/// **Response:** `{"success": true, "imported": n}`
pub async fn import_prospects(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    let prospects: Vec<NewProspect> = extract::record_list(&body, "prospects")?;
    let date = import_date(&body)?;

    let imported = state
        .prospection()
        .import(prospects, date, time::now())
        .await?;
    Ok(Json(json!({ "success": true, "imported": imported })))
}

fn import_date(body: &Value) -> ApiResult<NaiveDate> {
    match extract::body_object(body)?.get("date") {
        None | Some(Value::Null) => Ok(time::today()),
        Some(Value::String(raw)) => time::parse_day(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("date must be YYYY-MM-DD, got '{}'", raw))),
        Some(_) => Err(ApiError::BadRequest("date must be a string".to_string())),
    }
}

/// GET /api/prospection/:id/calls
pub async fn list_calls(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let calls = state.prospection().list_calls(&id).await?;
    Ok(Json(json!({
        "success": true,
        "count": calls.len(),
        "calls": calls,
    })))
}

/// POST /api/prospection/:id/calls
///
/// **Request:** `{"outcome": "answered", "durationSeconds": 90, "notes": "...", "calledAt"?}`
/// **Response:** `{"success": true, "call": {...}, "prospect": {...}}`
pub async fn log_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewCallLog>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (call, prospect) = state.prospection().log_call(&id, input, time::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "call": call,
            "prospect": prospect,
        })),
    ))
}

pub fn prospection_routes() -> Router<AppState> {
    Router::new()
        .route("/api/prospection", post(create_prospect))
        .route("/api/prospection/all", get(list_all))
        .route("/api/prospection/bulk-delete", post(bulk_delete))
        .route("/api/prospection/import", post(import_prospects))
        .route(
            "/api/prospection/:id",
            get(get_prospect).put(update_prospect).delete(delete_prospect),
        )
        .route("/api/prospection/:id/calls", get(list_calls).post(log_call))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_date_parsing() {
        assert_eq!(
            import_date(&json!({"date": "2024-02-29"})).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(import_date(&json!({})).unwrap(), time::today());
        assert!(import_date(&json!({"date": "29/02/2024"})).is_err());
        assert!(import_date(&json!({"date": 20240229})).is_err());
    }
}
