//! Call center management
//!
//! Single-record CRUD, bulk import, and the per-id bulk operations behind
//! `/api/external-crm/batch`.

use super::duplicates::MatchKey;
use super::BulkOutcome;
use ccrm_common::config::DuplicatePolicy;
use ccrm_common::events::{CrmEvent, EventBus};
use ccrm_common::models::{apply_json_updates, CallCenter, CallCenterStatus, NewCallCenter};
use ccrm_common::store::collections;
use ccrm_common::{time, uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Optional list filters; all given filters must match
#[derive(Debug, Clone, Default)]
pub struct CallCenterFilter {
    pub status: Option<CallCenterStatus>,
    pub country: Option<String>,
    pub tag: Option<String>,
}

impl CallCenterFilter {
    fn accepts(&self, cc: &CallCenter) -> bool {
        self.status.map_or(true, |status| cc.status == status)
            && self
                .country
                .as_deref()
                .map_or(true, |country| cc.country.eq_ignore_ascii_case(country.trim()))
            && self
                .tag
                .as_deref()
                .map_or(true, |tag| cc.tags.iter().any(|t| t == tag.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct ExternalCrmService {
    store: DocumentStore,
    events: EventBus,
    policy: DuplicatePolicy,
}

impl ExternalCrmService {
    pub fn new(store: DocumentStore, events: EventBus, policy: DuplicatePolicy) -> Self {
        Self { store, events, policy }
    }

    pub async fn list(&self, filter: &CallCenterFilter) -> Result<Vec<CallCenter>> {
        let all: Vec<CallCenter> = self.store.list(collections::CALL_CENTERS).await?;
        Ok(all.into_iter().filter(|cc| filter.accepts(cc)).collect())
    }

    pub async fn get(&self, id: &str) -> Result<CallCenter> {
        self.store.require(collections::CALL_CENTERS, id).await
    }

    pub async fn create(&self, input: NewCallCenter, now: DateTime<Utc>) -> Result<CallCenter> {
        let cc = input.into_call_center(uuid_utils::generate(), now)?;
        self.store.create(collections::CALL_CENTERS, &cc.id, &cc).await?;
        info!(id = %cc.id, name = %cc.name, "Call center created");
        Ok(cc)
    }

    /// Partial update from a JSON map of camelCase fields
    pub async fn update(
        &self,
        id: &str,
        updates: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<CallCenter> {
        self.store
            .modify(collections::CALL_CENTERS, id, |cc: &mut CallCenter| {
                *cc = apply_json_updates(cc, updates)?;
                cc.updated_at = now;
                Ok(())
            })
            .await
    }

    /// Delete one call center with its contacts, steps and calendar entries
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.exists(collections::CALL_CENTERS, id).await? {
            return Err(Error::not_found(collections::CALL_CENTERS, id));
        }
        let mut batch = self.store.batch();
        batch
            .delete_tree(collections::CALL_CENTERS, id)
            .delete_where_eq(collections::CALENDAR_EVENTS, "parentId", id)
            .delete_where_eq(collections::SCHEDULED_TASKS, "callCenterId", id);
        batch.commit(&self.store).await?;
        info!(id, "Call center deleted");
        Ok(())
    }

    /// Create many call centers in one atomic write
    ///
    /// Every record is validated before anything is written; an empty input
    /// performs no writes. With `skip_duplicates`, records matching an
    /// existing call center (or an earlier record of the same import) under
    /// the duplicate policy are skipped.
    pub async fn bulk_import(
        &self,
        inputs: Vec<NewCallCenter>,
        skip_duplicates: bool,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary> {
        if inputs.is_empty() {
            return Ok(ImportSummary { imported: 0, skipped: 0 });
        }

        let mut records = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let cc = input
                .into_call_center(uuid_utils::generate(), now)
                .map_err(|e| match e {
                    Error::InvalidInput(msg) => {
                        Error::InvalidInput(format!("callCenters[{}]: {}", index, msg))
                    }
                    other => other,
                })?;
            records.push(cc);
        }

        let mut known: Vec<MatchKey> = if skip_duplicates {
            self.store
                .list::<CallCenter>(collections::CALL_CENTERS)
                .await?
                .iter()
                .map(|cc| MatchKey::for_call_center(&self.policy, cc))
                .collect()
        } else {
            Vec::new()
        };

        let mut batch = self.store.batch();
        let mut skipped = 0;
        for cc in &records {
            if skip_duplicates {
                let key = MatchKey::for_call_center(&self.policy, cc);
                if known.iter().any(|k| k.matches(&key)) {
                    skipped += 1;
                    continue;
                }
                known.push(key);
            }
            batch.create(collections::CALL_CENTERS, &cc.id, cc)?;
        }

        let imported = batch.commit(&self.store).await?;
        if skipped > 0 {
            warn!(skipped, "Skipped duplicate call centers during import");
        }
        info!(imported, "Call centers imported");

        if imported > 0 {
            self.events.emit_lossy(CrmEvent::CallCentersImported {
                count: imported,
                timestamp: time::now(),
            });
        }

        Ok(ImportSummary { imported, skipped })
    }

    pub async fn batch_delete(&self, ids: &[String]) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            outcome.record(id, self.delete(id).await);
        }

        if outcome.succeeded_count() > 0 {
            self.events.emit_lossy(CrmEvent::CallCentersDeleted {
                count: outcome.succeeded_count(),
                timestamp: time::now(),
            });
        }
        Ok(outcome)
    }

    /// Add `tag` to every id; an id already carrying it still succeeds
    pub async fn batch_tag(&self, ids: &[String], tag: &str, now: DateTime<Utc>) -> Result<BulkOutcome> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::InvalidInput("tag is required".to_string()));
        }

        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = self
                .store
                .modify(collections::CALL_CENTERS, id, |cc: &mut CallCenter| {
                    if cc.add_tag(tag) {
                        cc.updated_at = now;
                    }
                    Ok(())
                })
                .await
                .map(|_| ());
            outcome.record(id, result);
        }
        Ok(outcome)
    }

    pub async fn batch_update(
        &self,
        ids: &[String],
        updates: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<BulkOutcome> {
        if updates.is_empty() {
            return Err(Error::InvalidInput("updates must not be empty".to_string()));
        }
        for key in ["id", "createdAt", "updatedAt"] {
            if updates.contains_key(key) {
                return Err(Error::InvalidInput(format!("Field '{}' cannot be updated", key)));
            }
        }

        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = self.update(id, updates, now).await.map(|_| ());
            outcome.record(id, result);
        }
        Ok(outcome)
    }

    /// Remove every call center; returns how many were deleted
    ///
    /// Owned calendar events, follow-up tasks and daily sessions go in the
    /// same transaction.
    pub async fn delete_all(&self) -> Result<u64> {
        let mut batch = self.store.batch();
        batch
            .delete_where_eq(collections::CALENDAR_EVENTS, "parentKind", "callCenter")
            .delete_collection(collections::SCHEDULED_TASKS)
            .delete_collection(collections::DAILY_CALL_SESSIONS)
            .delete_collection(collections::DAILY_WHATSAPP_SESSIONS)
            .delete_collection(collections::CALL_CENTERS);
        let counts = batch.commit_counted(&self.store).await?;
        let deleted = counts.last().copied().unwrap_or(0);
        warn!(deleted, "All call centers deleted");

        self.events.emit_lossy(CrmEvent::CallCentersDeleted {
            count: deleted as usize,
            timestamp: time::now(),
        });
        Ok(deleted)
    }
}
