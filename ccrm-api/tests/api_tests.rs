//! Router-level tests against an in-memory store
//!
//! Each test builds a fresh store, drives the router with `oneshot`, and
//! checks both the JSON envelope and what ended up in the store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ccrm_api::{build_router, AppState, EVENT_BUS_CAPACITY};
use ccrm_common::events::EventBus;
use ccrm_common::models::{CalendarEvent, CallCenter, NewCallCenter};
use ccrm_common::store::collections;
use ccrm_common::{time, DocumentStore};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

/// Test helper: router plus a handle on its store
async fn setup_app() -> (Router, DocumentStore) {
    let store = DocumentStore::open_in_memory()
        .await
        .expect("Should open in-memory store");
    let state = AppState::new(store.clone(), EventBus::new(EVENT_BUS_CAPACITY));
    (build_router(state), store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_raw(uri: &str, raw: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw))
        .unwrap()
}

/// Test helper: send a request, return status and parsed body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = serde_json::from_slice(&bytes).expect("Should parse JSON");
    (status, body)
}

async fn seed_call_center(store: &DocumentStore, name: &str, phones: &[&str]) -> CallCenter {
    let cc = NewCallCenter {
        name: name.to_string(),
        country: "France".to_string(),
        city: "Paris".to_string(),
        phones: phones.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
    .into_call_center(ccrm_common::uuid_utils::generate(), time::now())
    .unwrap();
    store.create(collections::CALL_CENTERS, &cc.id, &cc).await.unwrap();
    cc
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _store) = setup_app().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ccrm-api");
    assert_eq!(body["store"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_reports_degraded_when_store_closed() {
    let (app, store) = setup_app().await;
    store.pool().close().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"], "unavailable");
}

// =============================================================================
// Call centers
// =============================================================================

#[tokio::test]
async fn test_create_and_fetch_call_center() {
    let (app, _store) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/call-centers",
            json!({"name": "Acme Calls", "country": "Morocco", "phones": ["+212 600 000 000"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["callCenter"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/api/external-crm/call-centers/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["callCenter"]["name"], "Acme Calls");
    assert_eq!(body["callCenter"]["status"], "New");
}

#[tokio::test]
async fn test_create_without_name_is_bad_request() {
    let (app, store) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json("/api/external-crm/call-centers", json!({"name": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert_eq!(store.count(collections::CALL_CENTERS).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_call_center_is_not_found() {
    let (app, _store) = setup_app().await;

    let (status, body) = send(&app, get("/api/external-crm/call-centers/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_list_rejects_unknown_status() {
    let (app, _store) = setup_app().await;

    let (status, _) = send(&app, get("/api/external-crm/call-centers?status=maybe")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (app, _store) = setup_app().await;

    let (status, body) = send(&app, post_raw("/api/external-crm/import", "{\"callCenters\": [")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_empty_import_writes_nothing() {
    let (app, store) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json("/api/external-crm/import", json!({"callCenters": []})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 0);
    assert_eq!(body["skipped"], 0);
    assert_eq!(store.count(collections::CALL_CENTERS).await.unwrap(), 0);
}

#[tokio::test]
async fn test_import_with_invalid_record_writes_nothing() {
    let (app, store) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/import",
            json!({"callCenters": [{"name": "Valid"}, {"name": ""}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(store.count(collections::CALL_CENTERS).await.unwrap(), 0);
}

#[tokio::test]
async fn test_import_skips_duplicates_when_asked() {
    let (app, store) = setup_app().await;
    seed_call_center(&store, "Acme Calls", &["+33 1 23 45 67 89"]).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/import",
            json!({
                "skipDuplicates": true,
                "callCenters": [
                    {"name": "ACME calls", "country": "france", "city": "paris"},
                    {"name": "Fresh Leads", "country": "Spain", "city": "Madrid"}
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);
    assert_eq!(body["skipped"], 1);
    assert_eq!(store.count(collections::CALL_CENTERS).await.unwrap(), 2);
}

// =============================================================================
// Batch operations
// =============================================================================

#[tokio::test]
async fn test_batch_delete_reports_count_then_not_found() {
    let (app, store) = setup_app().await;
    let a = seed_call_center(&store, "A", &[]).await;
    let b = seed_call_center(&store, "B", &[]).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/batch",
            json!({"action": "delete", "callCenterIds": [a.id, b.id, "ghost"]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 2);
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
    assert_eq!(body["failures"][0]["id"], "ghost");
    assert_eq!(body["failures"][0]["error"], "not found");

    let (status, _) = send(&app, get(&format!("/api/external-crm/call-centers/{}", a.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_tag_is_idempotent() {
    let (app, store) = setup_app().await;
    let cc = seed_call_center(&store, "A", &[]).await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            post_json(
                "/api/external-crm/batch",
                json!({"action": "tag", "callCenterIds": [cc.id], "tag": "vip"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taggedCount"], 1);
    }

    let stored: CallCenter = store.require(collections::CALL_CENTERS, &cc.id).await.unwrap();
    assert_eq!(stored.tags, vec!["vip"]);
}

#[tokio::test]
async fn test_batch_rejects_non_array_ids_without_writes() {
    let (app, store) = setup_app().await;
    let cc = seed_call_center(&store, "A", &[]).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/batch",
            json!({"action": "delete", "callCenterIds": cc.id}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "callCenterIds must be an array");
    assert!(store.exists(collections::CALL_CENTERS, &cc.id).await.unwrap());
}

#[tokio::test]
async fn test_batch_unknown_action() {
    let (app, _store) = setup_app().await;

    let (status, _) = send(
        &app,
        post_json("/api/external-crm/batch", json!({"action": "explode", "callCenterIds": ["x"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_all_empties_collection() {
    let (app, store) = setup_app().await;
    seed_call_center(&store, "A", &[]).await;
    seed_call_center(&store, "B", &[]).await;

    let (status, body) = send(&app, delete("/api/external-crm/delete-all")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert_eq!(store.count(collections::CALL_CENTERS).await.unwrap(), 0);
}

// =============================================================================
// Suggestions
// =============================================================================

#[tokio::test]
async fn test_accept_suggestion_creates_call_center() {
    let (app, store) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/external-crm/suggestions",
            json!({"callCenter": {"name": "Suggested Co"}, "reason": "referral", "score": 0.8}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let suggestion_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/external-crm/suggestions/{}/accept", suggestion_id),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cc_id = body["callCenterId"].as_str().unwrap();

    let cc: CallCenter = store.require(collections::CALL_CENTERS, cc_id).await.unwrap();
    assert_eq!(cc.name, "Suggested Co");
    assert!(!store.exists(collections::SUGGESTIONS, &suggestion_id).await.unwrap());

    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/external-crm/suggestions/{}/accept", suggestion_id),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Daily sessions
// =============================================================================

#[tokio::test]
async fn test_whatsapp_move_round_trip() {
    let (app, _store) = setup_app().await;
    let base = "/api/external-crm/daily-whatsapp";

    let (status, body) = send(
        &app,
        post_json(&format!("{}/select", base), json!({"callCenterIds": ["a", "b"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selectedCount"], 2);

    let (_, body) = send(
        &app,
        post_json(&format!("{}/move-to-sent", base), json!({"callCenterIds": ["a"]})),
    )
    .await;
    assert_eq!(body["movedCount"], 1);
    assert_eq!(body["session"]["completedIds"], json!(["a"]));
    assert_eq!(body["session"]["suggestedIds"], json!(["b"]));

    let (_, body) = send(
        &app,
        post_json(&format!("{}/move-to-suggestions", base), json!({"callCenterIds": ["a"]})),
    )
    .await;
    assert_eq!(body["movedCount"], 1);
    assert_eq!(body["session"]["completedIds"], json!([]));
    assert_eq!(body["session"]["suggestedIds"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_clear_session_is_idempotent() {
    let (app, _store) = setup_app().await;
    let base = "/api/external-crm/daily-calls";

    send(
        &app,
        post_json(&format!("{}/select", base), json!({"callCenterIds": ["a"]})),
    )
    .await;

    let (status, first) = send(&app, post_json(&format!("{}/clear-session", base), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, post_json(&format!("{}/clear-session", base), json!({}))).await;

    assert_eq!(first["sessionId"], second["sessionId"]);
    assert_eq!(first["sessionId"], time::day_key(time::today()));
    assert_eq!(second["session"]["suggestedIds"], json!([]));
    assert_eq!(second["session"]["completedIds"], json!([]));
}

#[tokio::test]
async fn test_session_channels_are_separate() {
    let (app, _store) = setup_app().await;

    send(
        &app,
        post_json("/api/external-crm/daily-calls/mark-called", json!({"callCenterIds": ["a"]})),
    )
    .await;

    let (status, body) = send(&app, get("/api/external-crm/daily-whatsapp")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["completedIds"], json!([]));
}

#[tokio::test]
async fn test_session_rejects_non_array_ids() {
    let (app, store) = setup_app().await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/external-crm/daily-whatsapp/select",
            json!({"callCenterIds": "a"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count(collections::DAILY_WHATSAPP_SESSIONS).await.unwrap(), 0);
}

// =============================================================================
// Prospection
// =============================================================================

#[tokio::test]
async fn test_prospect_bulk_delete_rejects_non_array() {
    let (app, store) = setup_app().await;

    let (_, body) = send(
        &app,
        post_json(
            "/api/prospection/import",
            json!({"prospects": [{"name": "P1"}], "date": "2024-05-01"}),
        ),
    )
    .await;
    assert_eq!(body["imported"], 1);

    let (status, _) = send(
        &app,
        post_json("/api/prospection/bulk-delete", json!({"prospectIds": {"id": "x"}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count(collections::PROSPECTS).await.unwrap(), 1);
}

#[tokio::test]
async fn test_prospect_import_bad_date() {
    let (app, store) = setup_app().await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/prospection/import",
            json!({"prospects": [{"name": "P1"}], "date": "01/05/2024"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count(collections::PROSPECTS).await.unwrap(), 0);
}

// =============================================================================
// Steps and calendar
// =============================================================================

#[tokio::test]
async fn test_step_creates_calendar_event() {
    let (app, store) = setup_app().await;
    let cc = seed_call_center(&store, "Acme Calls", &[]).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/external-crm/call-centers/{}/steps", cc.id),
            json!({
                "title": "Demo",
                "kind": "meeting",
                "scheduledFor": "2030-01-15T09:00:00Z",
                "durationMinutes": 45
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["calendarEvent"]["id"].as_str().unwrap();
    assert_eq!(body["step"]["calendarEventId"], event_id);

    let event: CalendarEvent = store.require(collections::CALENDAR_EVENTS, event_id).await.unwrap();
    assert_eq!(event.title, "Demo - Acme Calls");
    assert_eq!(event.parent_id, cc.id);

    let (status, body) = send(
        &app,
        get("/api/calendar/events?from=2030-01-15T00:00:00Z&to=2030-01-16T00:00:00Z"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_step_on_missing_parent_is_not_found() {
    let (app, store) = setup_app().await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/prospection/ghost/steps",
            json!({"title": "Call", "scheduledFor": "2030-01-15T09:00:00Z"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.count(collections::CALENDAR_EVENTS).await.unwrap(), 0);
}

#[tokio::test]
async fn test_calendar_rejects_bad_bounds() {
    let (app, _store) = setup_app().await;

    let (status, _) = send(&app, get("/api/calendar/events?from=yesterday")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Scheduling
// =============================================================================

#[tokio::test]
async fn test_generate_test_schedule() {
    let (app, store) = setup_app().await;
    seed_call_center(&store, "Reachable", &["+33 1 23 45 67 89"]).await;
    seed_call_center(&store, "Silent", &[]).await;

    let (status, body) = send(
        &app,
        post_json("/api/generate-test-schedule", json!({"userId": "user-1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["taskCount"], 1);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get("/api/scheduling/tasks?userId=user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["tasks"][0]["callCenterName"], "Reachable");
    assert_eq!(body["tasks"][0]["kind"], "call");
}

#[tokio::test]
async fn test_generate_test_schedule_requires_user() {
    let (app, _store) = setup_app().await;

    let (status, _) = send(&app, post_json("/api/generate-test-schedule", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/scheduling/tasks")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
