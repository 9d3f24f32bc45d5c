//! Calendar endpoint

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Query parameters for GET /api/calendar/events (RFC 3339 bounds)
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_bound(name: &str, raw: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| ApiError::BadRequest(format!("{} must be an RFC 3339 timestamp", name))),
    }
}

/// GET /api/calendar/events?from=&to=
///
/// Events overlapping the window, ordered by start time.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<Value>> {
    let from = parse_bound("from", query.from.as_deref())?;
    let to = parse_bound("to", query.to.as_deref())?;

    let events = state.calendar().list(from, to).await?;
    Ok(Json(json!({
        "success": true,
        "count": events.len(),
        "events": events,
    })))
}

pub fn calendar_routes() -> Router<AppState> {
    Router::new().route("/api/calendar/events", get(list_events))
}
