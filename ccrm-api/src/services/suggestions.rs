//! Suggested call centers pending review

use ccrm_common::events::{CrmEvent, EventBus};
use ccrm_common::models::{NewSuggestion, Suggestion};
use ccrm_common::store::collections;
use ccrm_common::{uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Clone)]
pub struct SuggestionService {
    store: DocumentStore,
    events: EventBus,
}

impl SuggestionService {
    pub fn new(store: DocumentStore, events: EventBus) -> Self {
        Self { store, events }
    }

    pub async fn list(&self) -> Result<Vec<Suggestion>> {
        self.store.list(collections::SUGGESTIONS).await
    }

    /// Store a suggestion; returns its id
    pub async fn create(&self, input: NewSuggestion, now: DateTime<Utc>) -> Result<String> {
        let suggestion = input.into_suggestion(uuid_utils::generate(), now)?;
        self.store
            .create(collections::SUGGESTIONS, &suggestion.id, &suggestion)
            .await?;
        info!(id = %suggestion.id, name = %suggestion.call_center.name, "Suggestion created");
        Ok(suggestion.id)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete(collections::SUGGESTIONS, id).await? {
            Ok(())
        } else {
            Err(Error::not_found(collections::SUGGESTIONS, id))
        }
    }

    /// Promote a suggestion to a call center
    ///
    /// The call center is created and the suggestion removed in one batch.
    /// Returns the new call center id.
    pub async fn accept(&self, id: &str, now: DateTime<Utc>) -> Result<String> {
        let suggestion: Suggestion = self.store.require(collections::SUGGESTIONS, id).await?;
        let call_center = suggestion
            .call_center
            .into_call_center(uuid_utils::generate(), now)?;

        let mut batch = self.store.batch();
        batch.create(collections::CALL_CENTERS, &call_center.id, &call_center)?;
        batch.delete(collections::SUGGESTIONS, id);
        batch.commit(&self.store).await?;

        info!(suggestion = id, call_center = %call_center.id, "Suggestion accepted");
        self.events.emit_lossy(CrmEvent::SuggestionAccepted {
            suggestion_id: id.to_string(),
            call_center_id: call_center.id.clone(),
            timestamp: now,
        });
        Ok(call_center.id)
    }

    pub async fn reject(&self, id: &str) -> Result<()> {
        self.delete(id).await?;
        info!(suggestion = id, "Suggestion rejected");
        Ok(())
    }
}
