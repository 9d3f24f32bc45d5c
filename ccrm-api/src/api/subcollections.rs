//! Contacts and steps of call centers and prospects
//!
//! Both parent kinds expose the same routes:
//! `/api/external-crm/call-centers/:id/{contacts,steps}` and
//! `/api/prospection/:id/{contacts,steps}`.

use crate::extract::{self, ApiJson};
use crate::services::ParentRef;
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use ccrm_common::models::{NewContact, NewStep, ParentKind};
use ccrm_common::time;
use serde_json::{json, Value};

fn parent(kind: ParentKind, id: String) -> ParentRef {
    ParentRef { kind, id }
}

pub async fn list_contacts(state: AppState, parent: ParentRef) -> ApiResult<Json<Value>> {
    let contacts = state.contacts().list(&parent).await?;
    Ok(Json(json!({
        "success": true,
        "count": contacts.len(),
        "contacts": contacts,
    })))
}

pub async fn create_contact(
    state: AppState,
    parent: ParentRef,
    input: NewContact,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let contact = state.contacts().create(&parent, input, time::now()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "contact": contact }))))
}

pub async fn update_contact(
    state: AppState,
    parent: ParentRef,
    contact_id: String,
    body: Value,
) -> ApiResult<Json<Value>> {
    let updates = extract::body_object(&body)?;
    let contact = state
        .contacts()
        .update(&parent, &contact_id, updates, time::now())
        .await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}

pub async fn delete_contact(state: AppState, parent: ParentRef, contact_id: String) -> ApiResult<Json<Value>> {
    state.contacts().delete(&parent, &contact_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_steps(state: AppState, parent: ParentRef) -> ApiResult<Json<Value>> {
    let steps = state.steps().list(&parent).await?;
    Ok(Json(json!({
        "success": true,
        "count": steps.len(),
        "steps": steps,
    })))
}

/// Creates the step and its calendar event together
pub async fn create_step(
    state: AppState,
    parent: ParentRef,
    input: NewStep,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let created = state.steps().create(&parent, input, time::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "step": created.step,
            "calendarEvent": created.calendar_event,
        })),
    ))
}

pub async fn update_step(
    state: AppState,
    parent: ParentRef,
    step_id: String,
    body: Value,
) -> ApiResult<Json<Value>> {
    let updates = extract::body_object(&body)?;
    let step = state
        .steps()
        .update(&parent, &step_id, updates, time::now())
        .await?;
    Ok(Json(json!({ "success": true, "step": step })))
}

pub async fn delete_step(state: AppState, parent: ParentRef, step_id: String) -> ApiResult<Json<Value>> {
    state.steps().delete(&parent, &step_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Contact and step routes beneath `<base>/:id`
fn parent_routes(base: &str, kind: ParentKind) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/:id/contacts", base),
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                list_contacts(state, parent(kind, id))
            })
            .post(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      ApiJson(input): ApiJson<NewContact>| {
                    create_contact(state, parent(kind, id), input)
                },
            ),
        )
        .route(
            &format!("{}/:id/contacts/:contact_id", base),
            put(
                move |State(state): State<AppState>,
                      Path((id, contact_id)): Path<(String, String)>,
                      ApiJson(body): ApiJson<Value>| {
                    update_contact(state, parent(kind, id), contact_id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, Path((id, contact_id)): Path<(String, String)>| {
                    delete_contact(state, parent(kind, id), contact_id)
                },
            ),
        )
        .route(
            &format!("{}/:id/steps", base),
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                list_steps(state, parent(kind, id))
            })
            .post(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      ApiJson(input): ApiJson<NewStep>| {
                    create_step(state, parent(kind, id), input)
                },
            ),
        )
        .route(
            &format!("{}/:id/steps/:step_id", base),
            put(
                move |State(state): State<AppState>,
                      Path((id, step_id)): Path<(String, String)>,
                      ApiJson(body): ApiJson<Value>| {
                    update_step(state, parent(kind, id), step_id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, Path((id, step_id)): Path<(String, String)>| {
                    delete_step(state, parent(kind, id), step_id)
                },
            ),
        )
}

pub fn subcollection_routes() -> Router<AppState> {
    Router::new()
        .merge(parent_routes("/api/external-crm/call-centers", ParentKind::CallCenter))
        .merge(parent_routes("/api/prospection", ParentKind::Prospect))
}
