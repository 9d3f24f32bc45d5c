//! Scheduling endpoints

use crate::extract::{self, ApiJson};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use ccrm_common::models::Notification;
use ccrm_common::time;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleResponse {
    pub success: bool,
    pub task_count: usize,
    pub warnings: Vec<String>,
    pub notifications: Vec<Notification>,
}

/// POST /api/generate-test-schedule
///
/// **Request:** `{"userId": "..."}`
/// **Response:** `{"success": true, "taskCount": n, "warnings": [...], "notifications": [...]}`
///
/// Replaces the user's previously generated tasks.
pub async fn generate_test_schedule(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<GenerateScheduleResponse>> {
    let user_id = extract::required_string(&body, "userId")?;
    let report = state
        .scheduling_service()
        .generate_test_schedule(&user_id, time::now())
        .await?;

    Ok(Json(GenerateScheduleResponse {
        success: true,
        task_count: report.task_count,
        warnings: report.warnings,
        notifications: report.notifications,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksQuery {
    pub user_id: Option<String>,
}

/// GET /api/scheduling/tasks?userId=
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TasksQuery>,
) -> ApiResult<Json<Value>> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("userId is required".to_string()))?;

    let tasks = state.scheduling_service().list_tasks(user_id.trim()).await?;
    Ok(Json(json!({
        "success": true,
        "count": tasks.len(),
        "tasks": tasks,
    })))
}

pub fn scheduling_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate-test-schedule", post(generate_test_schedule))
        .route("/api/scheduling/tasks", get(list_tasks))
}
