//! Daily outreach session endpoints
//!
//! The WhatsApp and call sessions share handlers; only the base path and
//! the names of the two stage transitions differ:
//!
//! | Channel  | Base path                          | To completed   | Back to suggested      |
//! |----------|------------------------------------|----------------|------------------------|
//! | WhatsApp | `/api/external-crm/daily-whatsapp` | `move-to-sent` | `move-to-suggestions`  |
//! | Calls    | `/api/external-crm/daily-calls`    | `mark-called`  | `unmark-called`        |
//!
//! Every handler works on today's session (UTC day).

use crate::extract::{self, ApiJson};
use crate::services::SessionChange;
use crate::{ApiResult, AppState};
use axum::{extract::State, routing::get, routing::post, Json, Router};
use ccrm_common::models::{DailySessionView, SessionChannel};
use ccrm_common::time;
use serde::Serialize;
use serde_json::Value;

const IDS_FIELD: &str = "callCenterIds";

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: DailySessionView,
}

/// Response to an id-list change; `count_field` names the count
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChangeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub count: CountField,
    pub session: DailySessionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CountField {
    SelectedCount(usize),
    MovedCount(usize),
    RemovedCount(usize),
}

impl SessionChangeResponse {
    fn new(change: SessionChange, count: fn(usize) -> CountField) -> Self {
        Self {
            success: true,
            count: count(change.changed),
            session: change.session.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub session: DailySessionView,
}

/// GET `<base>`: today's session, created on first access
pub async fn get_session(state: AppState, channel: SessionChannel) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .daily_sessions(channel)
        .get_or_create(time::today(), time::now())
        .await?;
    Ok(Json(SessionResponse {
        success: true,
        session: session.into(),
    }))
}

/// POST `<base>/select` `{"callCenterIds": [...]}`
pub async fn select(state: AppState, channel: SessionChannel, body: Value) -> ApiResult<Json<SessionChangeResponse>> {
    let ids = extract::id_list(&body, IDS_FIELD)?;
    let change = state
        .daily_sessions(channel)
        .select(time::today(), &ids, time::now())
        .await?;
    Ok(Json(SessionChangeResponse::new(change, CountField::SelectedCount)))
}

/// POST `<base>/move-to-sent` or `<base>/mark-called`
pub async fn move_to_completed(
    state: AppState,
    channel: SessionChannel,
    body: Value,
) -> ApiResult<Json<SessionChangeResponse>> {
    let ids = extract::id_list(&body, IDS_FIELD)?;
    let change = state
        .daily_sessions(channel)
        .move_to_completed(time::today(), &ids, time::now())
        .await?;
    Ok(Json(SessionChangeResponse::new(change, CountField::MovedCount)))
}

/// POST `<base>/move-to-suggestions` or `<base>/unmark-called`
pub async fn move_to_suggested(
    state: AppState,
    channel: SessionChannel,
    body: Value,
) -> ApiResult<Json<SessionChangeResponse>> {
    let ids = extract::id_list(&body, IDS_FIELD)?;
    let change = state
        .daily_sessions(channel)
        .move_to_suggested(time::today(), &ids, time::now())
        .await?;
    Ok(Json(SessionChangeResponse::new(change, CountField::MovedCount)))
}

/// POST `<base>/remove`
pub async fn remove(state: AppState, channel: SessionChannel, body: Value) -> ApiResult<Json<SessionChangeResponse>> {
    let ids = extract::id_list(&body, IDS_FIELD)?;
    let change = state
        .daily_sessions(channel)
        .remove(time::today(), &ids, time::now())
        .await?;
    Ok(Json(SessionChangeResponse::new(change, CountField::RemovedCount)))
}

/// POST `<base>/scores` `{"scores": {"<id>": 4.5}}`
pub async fn set_scores(state: AppState, channel: SessionChannel, body: Value) -> ApiResult<Json<SessionResponse>> {
    let scores = extract::score_map(&body, "scores")?;
    let change = state
        .daily_sessions(channel)
        .set_scores(time::today(), &scores, time::now())
        .await?;
    Ok(Json(SessionResponse {
        success: true,
        session: change.session.into(),
    }))
}

/// POST `<base>/clear-session`
///
/// Empties the session but keeps the document (same id, same createdAt).
pub async fn clear_session(state: AppState, channel: SessionChannel) -> ApiResult<Json<ClearSessionResponse>> {
    let session = state
        .daily_sessions(channel)
        .clear(time::today(), time::now())
        .await?;
    Ok(Json(ClearSessionResponse {
        success: true,
        session_id: session.id.clone(),
        session: session.into(),
    }))
}

/// Routes of one channel
fn channel_routes(
    base: &str,
    channel: SessionChannel,
    to_completed: &str,
    to_suggested: &str,
) -> Router<AppState> {
    Router::new()
        .route(
            base,
            get(move |State(state): State<AppState>| get_session(state, channel)),
        )
        .route(
            &format!("{}/select", base),
            post(move |State(state): State<AppState>, ApiJson(body): ApiJson<Value>| {
                select(state, channel, body)
            }),
        )
        .route(
            &format!("{}/{}", base, to_completed),
            post(move |State(state): State<AppState>, ApiJson(body): ApiJson<Value>| {
                move_to_completed(state, channel, body)
            }),
        )
        .route(
            &format!("{}/{}", base, to_suggested),
            post(move |State(state): State<AppState>, ApiJson(body): ApiJson<Value>| {
                move_to_suggested(state, channel, body)
            }),
        )
        .route(
            &format!("{}/remove", base),
            post(move |State(state): State<AppState>, ApiJson(body): ApiJson<Value>| {
                remove(state, channel, body)
            }),
        )
        .route(
            &format!("{}/scores", base),
            post(move |State(state): State<AppState>, ApiJson(body): ApiJson<Value>| {
                set_scores(state, channel, body)
            }),
        )
        .route(
            &format!("{}/clear-session", base),
            post(move |State(state): State<AppState>| clear_session(state, channel)),
        )
}

pub fn daily_session_routes() -> Router<AppState> {
    Router::new()
        .merge(channel_routes(
            "/api/external-crm/daily-whatsapp",
            SessionChannel::Whatsapp,
            "move-to-sent",
            "move-to-suggestions",
        ))
        .merge(channel_routes(
            "/api/external-crm/daily-calls",
            SessionChannel::Calls,
            "mark-called",
            "unmark-called",
        ))
}
