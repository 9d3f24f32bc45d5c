//! Prospection pipeline: prospects and their call logs

use super::{BulkOutcome, ParentRef};
use ccrm_common::models::{apply_json_updates, CallLog, NewCallLog, NewProspect, Prospect};
use ccrm_common::store::collections;
use ccrm_common::{uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::info;

const IMPORT_SOURCE: &str = "import";

#[derive(Clone)]
pub struct ProspectionService {
    store: DocumentStore,
}

impl ProspectionService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> Result<Vec<Prospect>> {
        self.store.list(collections::PROSPECTS).await
    }

    pub async fn get(&self, id: &str) -> Result<Prospect> {
        self.store.require(collections::PROSPECTS, id).await
    }

    pub async fn create(&self, input: NewProspect, now: DateTime<Utc>) -> Result<Prospect> {
        let prospect = input.into_prospect(uuid_utils::generate(), None, now)?;
        self.store
            .create(collections::PROSPECTS, &prospect.id, &prospect)
            .await?;
        info!(id = %prospect.id, "Prospect created");
        Ok(prospect)
    }

    pub async fn update(
        &self,
        id: &str,
        updates: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Prospect> {
        self.store
            .modify(collections::PROSPECTS, id, |p: &mut Prospect| {
                *p = apply_json_updates(p, updates)?;
                p.updated_at = now;
                Ok(())
            })
            .await
    }

    /// Delete a prospect with its contacts, steps, calls and calendar entries
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.exists(collections::PROSPECTS, id).await? {
            return Err(Error::not_found(collections::PROSPECTS, id));
        }
        let mut batch = self.store.batch();
        batch
            .delete_tree(collections::PROSPECTS, id)
            .delete_where_eq(collections::CALENDAR_EVENTS, "parentId", id);
        batch.commit(&self.store).await?;
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            outcome.record(id, self.delete(id).await);
        }
        info!(
            deleted = outcome.succeeded_count(),
            failed = outcome.failed.len(),
            "Prospects bulk delete finished"
        );
        Ok(outcome)
    }

    /// Create prospects from one import batch dated `date`
    ///
    /// All records are validated before the single atomic write. Records
    /// without a source are marked as imported.
    pub async fn import(
        &self,
        inputs: Vec<NewProspect>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut batch = self.store.batch();
        for (index, mut input) in inputs.into_iter().enumerate() {
            if input.source.trim().is_empty() {
                input.source = IMPORT_SOURCE.to_string();
            }
            let prospect = input
                .into_prospect(uuid_utils::generate(), Some(date), now)
                .map_err(|e| match e {
                    Error::InvalidInput(msg) => {
                        Error::InvalidInput(format!("prospects[{}]: {}", index, msg))
                    }
                    other => other,
                })?;
            batch.create(collections::PROSPECTS, &prospect.id, &prospect)?;
        }

        let imported = batch.commit(&self.store).await?;
        info!(imported, %date, "Prospects imported");
        Ok(imported)
    }

    /// Record a call against a prospect
    ///
    /// The call log and the prospect's counters are written together.
    pub async fn log_call(
        &self,
        id: &str,
        input: NewCallLog,
        now: DateTime<Utc>,
    ) -> Result<(CallLog, Prospect)> {
        let call = input.into_call_log(uuid_utils::generate(), now);
        let calls = ParentRef::prospect(id).child_collection(collections::CALLS);
        let mut batch = self.store.batch();
        batch.create(&calls, &call.id, &call)?;

        let prospect = self
            .store
            .modify_with(
                collections::PROSPECTS,
                id,
                |p: &mut Prospect| {
                    p.record_call(call.called_at);
                    p.updated_at = now;
                    Ok(())
                },
                batch,
            )
            .await?;

        info!(prospect = id, outcome = ?call.outcome, "Call logged");
        Ok((call, prospect))
    }

    /// Calls of a prospect, most recent first
    pub async fn list_calls(&self, id: &str) -> Result<Vec<CallLog>> {
        let parent = ParentRef::prospect(id);
        parent.ensure_exists(&self.store).await?;
        let mut calls: Vec<CallLog> = self
            .store
            .list(&parent.child_collection(collections::CALLS))
            .await?;
        calls.sort_by(|a, b| b.called_at.cmp(&a.called_at));
        Ok(calls)
    }
}
