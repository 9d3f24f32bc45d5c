//! Call center endpoints under `/api/external-crm`

use crate::extract::{self, ApiJson};
use crate::services::{BulkFailure, CallCenterFilter};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use ccrm_common::models::{CallCenter, CallCenterStatus, NewCallCenter};
use ccrm_common::time;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query parameters for GET /api/external-crm/call-centers
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub country: Option<String>,
    pub tag: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> ApiResult<CallCenterFilter> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                CallCenterStatus::parse_loose(raw)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", raw)))?,
            ),
        };
        Ok(CallCenterFilter {
            status,
            country: self.country.filter(|c| !c.trim().is_empty()),
            tag: self.tag.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCenterListResponse {
    pub success: bool,
    pub call_centers: Vec<CallCenter>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCenterResponse {
    pub success: bool,
    pub call_center: CallCenter,
}

/// GET /api/external-crm/call-centers?status=&country=&tag=
pub async fn list_call_centers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CallCenterListResponse>> {
    let filter = query.into_filter()?;
    let call_centers = state.external_crm().list(&filter).await?;
    Ok(Json(CallCenterListResponse {
        success: true,
        count: call_centers.len(),
        call_centers,
    }))
}

/// POST /api/external-crm/call-centers
pub async fn create_call_center(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCallCenter>,
) -> ApiResult<(StatusCode, Json<CallCenterResponse>)> {
    let call_center = state.external_crm().create(input, time::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CallCenterResponse {
            success: true,
            call_center,
        }),
    ))
}

/// GET /api/external-crm/call-centers/:id
pub async fn get_call_center(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CallCenterResponse>> {
    let call_center = state.external_crm().get(&id).await?;
    Ok(Json(CallCenterResponse {
        success: true,
        call_center,
    }))
}

/// PUT /api/external-crm/call-centers/:id
///
/// **Request:** any subset of call center fields (camelCase)
pub async fn update_call_center(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<CallCenterResponse>> {
    let updates = extract::body_object(&body)?;
    let call_center = state.external_crm().update(&id, updates, time::now()).await?;
    Ok(Json(CallCenterResponse {
        success: true,
        call_center,
    }))
}

/// DELETE /api/external-crm/call-centers/:id
pub async fn delete_call_center(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.external_crm().delete(&id).await?;
    Ok(Json(json!({ "success": true, "deleted": id })))
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub skipped: usize,
}

/// POST /api/external-crm/import
///
/// **Request:** `{"callCenters": [...], "skipDuplicates": false}`
/// **Response:** `{"success": true, "imported": n, "skipped": m}`
///
/// The whole body is validated first; nothing is written unless every
/// record is valid. An empty list imports nothing.
pub async fn import_call_centers(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ImportResponse>> {
    let records: Vec<NewCallCenter> = extract::record_list(&body, "callCenters")?;
    let skip_duplicates = extract::optional_bool(&body, "skipDuplicates")?;

    let summary = state
        .external_crm()
        .bulk_import(records, skip_duplicates, time::now())
        .await?;

    Ok(Json(ImportResponse {
        success: true,
        imported: summary.imported,
        skipped: summary.skipped,
    }))
}

/// POST /api/external-crm/duplicates
///
/// **Request:** `{"callCenter": {...}}`
pub async fn find_duplicates(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    let candidate = extract::required_object(&body, "callCenter")?;
    let candidate: NewCallCenter = serde_json::from_value(Value::Object(candidate.clone()))
        .map_err(|e| ApiError::BadRequest(format!("callCenter: {}", e)))?;

    let duplicates = state.duplicate_detection().find_duplicates(&candidate).await?;
    Ok(Json(json!({
        "success": true,
        "count": duplicates.len(),
        "duplicates": duplicates,
    })))
}

/// Bulk actions accepted by POST /api/external-crm/batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchAction {
    Delete,
    Tag,
    Update,
    DeleteAll,
}

impl BatchAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "delete" => Some(Self::Delete),
            "tag" => Some(Self::Tag),
            "update" => Some(Self::Update),
            "deleteAll" => Some(Self::DeleteAll),
            _ => None,
        }
    }
}

/// POST /api/external-crm/batch
///
/// **Request:** `{"action": "delete"|"tag"|"update"|"deleteAll", "callCenterIds": [...], "tag"?, "updates"?}`
/// **Response:** `{"success": true, "action", "<verb>Count", "failures": [{id, error}]}`
///
/// All input is validated before the first write. Each id is then processed
/// on its own; ids that fail are listed in `failures` and do not stop the
/// rest.
pub async fn batch_operation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    let raw_action = extract::required_string(&body, "action")?;
    let action = BatchAction::parse(&raw_action)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown action: {}", raw_action)))?;

    let service = state.external_crm();
    let now = time::now();

    let (count_field, outcome) = match action {
        BatchAction::DeleteAll => {
            let deleted = service.delete_all().await?;
            return Ok(Json(json!({
                "success": true,
                "action": raw_action,
                "deleted": deleted,
            })));
        }
        BatchAction::Delete => {
            let ids = extract::id_list(&body, "callCenterIds")?;
            ("deletedCount", service.batch_delete(&ids).await?)
        }
        BatchAction::Tag => {
            let ids = extract::id_list(&body, "callCenterIds")?;
            let tag = extract::required_string(&body, "tag")?;
            ("taggedCount", service.batch_tag(&ids, &tag, now).await?)
        }
        BatchAction::Update => {
            let ids = extract::id_list(&body, "callCenterIds")?;
            let updates = extract::required_object(&body, "updates")?;
            ("updatedCount", service.batch_update(&ids, updates, now).await?)
        }
    };

    Ok(Json(bulk_response(&raw_action, count_field, outcome.succeeded_count(), &outcome.failed)))
}

fn bulk_response(action: &str, count_field: &str, count: usize, failures: &[BulkFailure]) -> Value {
    let mut body = json!({
        "success": true,
        "action": action,
        "failures": failures,
    });
    body[count_field] = json!(count);
    body
}

/// DELETE /api/external-crm/delete-all
pub async fn delete_all(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let deleted = state.external_crm().delete_all().await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub fn external_crm_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/external-crm/call-centers",
            get(list_call_centers).post(create_call_center),
        )
        .route(
            "/api/external-crm/call-centers/:id",
            get(get_call_center)
                .put(update_call_center)
                .delete(delete_call_center),
        )
        .route("/api/external-crm/import", post(import_call_centers))
        .route("/api/external-crm/duplicates", post(find_duplicates))
        .route("/api/external-crm/batch", post(batch_operation))
        .route("/api/external-crm/delete-all", delete(delete_all))
}
