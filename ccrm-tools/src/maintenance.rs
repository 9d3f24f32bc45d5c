//! Direct store maintenance
//!
//! These operations bypass the HTTP layer and work on the store file of a
//! stopped (or idle) server.

use crate::cleaning::split_values;
use ccrm_common::models::ParentKind;
use ccrm_common::store::collections;
use ccrm_common::{DocumentStore, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Delete every document of `collection` with its subcollections
///
/// For call centers and prospects the calendar events they own are removed
/// as well; emptying call centers also drops follow-up tasks and daily
/// sessions. Everything is one transaction. Returns the number of
/// top-level documents deleted.
pub async fn delete_all(store: &DocumentStore, collection: &str) -> Result<u64> {
    let parent_kind = match collection {
        collections::CALL_CENTERS => Some(ParentKind::CallCenter),
        collections::PROSPECTS => Some(ParentKind::Prospect),
        _ => None,
    };

    let mut batch = store.batch();
    if let Some(kind) = parent_kind {
        let kind_value = serde_json::to_value(kind)?;
        if let Some(kind_name) = kind_value.as_str() {
            batch.delete_where_eq(collections::CALENDAR_EVENTS, "parentKind", kind_name);
        }
    }
    if collection == collections::CALL_CENTERS {
        batch
            .delete_collection(collections::SCHEDULED_TASKS)
            .delete_collection(collections::DAILY_CALL_SESSIONS)
            .delete_collection(collections::DAILY_WHATSAPP_SESSIONS);
    }
    batch.delete_collection(collection);

    let counts = batch.commit_counted(store).await?;
    let deleted = counts.last().copied().unwrap_or(0);
    info!(collection, deleted, "Collection emptied");
    Ok(deleted)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
}

/// Bring legacy call center documents to the current shape
///
/// Scalar `phone`/`email` fields are folded into the `phones`/`emails`
/// arrays and removed; missing list fields become empty arrays. All changes
/// are written in one batch.
pub async fn backfill(store: &DocumentStore) -> Result<BackfillReport> {
    let documents = store.list_raw(collections::CALL_CENTERS).await?;
    let mut report = BackfillReport {
        scanned: documents.len(),
        ..Default::default()
    };

    let mut batch = store.batch();
    for mut doc in documents {
        let Some(object) = doc.data.as_object_mut() else {
            continue;
        };
        if backfill_document(object) {
            debug!(id = %doc.id, "Backfilling call center");
            batch.set(collections::CALL_CENTERS, &doc.id, &doc.data)?;
            report.updated += 1;
        }
    }
    batch.commit(store).await?;

    info!(scanned = report.scanned, updated = report.updated, "Backfill complete");
    Ok(report)
}

/// Returns true if the document changed
fn backfill_document(object: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    changed |= fold_scalar(object, "phone", "phones", false);
    changed |= fold_scalar(object, "email", "emails", true);

    for field in ["phones", "emails", "tags"] {
        match object.get(field) {
            Some(Value::Array(_)) => {}
            _ => {
                object.insert(field.to_string(), Value::Array(Vec::new()));
                changed = true;
            }
        }
    }

    changed
}

fn fold_scalar(object: &mut Map<String, Value>, scalar: &str, list: &str, lowercase: bool) -> bool {
    let Some(legacy) = object.remove(scalar) else {
        return false;
    };

    let mut values: Vec<String> = match object.remove(list) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    if let Value::String(raw) = legacy {
        for value in split_values(&raw) {
            let value = if lowercase { value.to_lowercase() } else { value };
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }

    object.insert(
        list.to_string(),
        Value::Array(values.into_iter().map(Value::String).collect()),
    );
    true
}
