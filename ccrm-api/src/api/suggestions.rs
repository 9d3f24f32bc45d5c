//! Suggestion endpoints under `/api/external-crm/suggestions`

use crate::extract::ApiJson;
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use ccrm_common::models::NewSuggestion;
use ccrm_common::time;
use serde_json::{json, Value};

/// GET /api/external-crm/suggestions
pub async fn list_suggestions(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let suggestions = state.suggestions().list().await?;
    Ok(Json(json!({
        "success": true,
        "count": suggestions.len(),
        "suggestions": suggestions,
    })))
}

/// POST /api/external-crm/suggestions
///
/// **Request:** `{"callCenter": {...}, "reason": "...", "score": 0.7}`
/// **Response:** `{"success": true, "id": "..."}`
pub async fn create_suggestion(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSuggestion>,
) -> ApiResult<Json<Value>> {
    let id = state.suggestions().create(input, time::now()).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// DELETE /api/external-crm/suggestions/:id
pub async fn delete_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.suggestions().delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/external-crm/suggestions/:id/accept
///
/// **Response:** `{"success": true, "callCenterId": "..."}`
pub async fn accept_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let call_center_id = state.suggestions().accept(&id, time::now()).await?;
    Ok(Json(json!({ "success": true, "callCenterId": call_center_id })))
}

/// POST /api/external-crm/suggestions/:id/reject
pub async fn reject_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.suggestions().reject(&id).await?;
    Ok(Json(json!({ "success": true })))
}

pub fn suggestion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/external-crm/suggestions",
            get(list_suggestions).post(create_suggestion),
        )
        .route("/api/external-crm/suggestions/:id", delete(delete_suggestion))
        .route("/api/external-crm/suggestions/:id/accept", post(accept_suggestion))
        .route("/api/external-crm/suggestions/:id/reject", post(reject_suggestion))
}
