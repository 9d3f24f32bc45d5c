//! Pipeline steps and their calendar entries
//!
//! A step and its calendar event are always written together: creating a
//! step inserts both in one batch, deleting a step removes both.

use super::ParentRef;
use ccrm_common::events::{CrmEvent, EventBus};
use ccrm_common::models::{apply_json_updates, CalendarEvent, NewStep, Step};
use ccrm_common::store::collections;
use ccrm_common::{uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepWithEvent {
    pub step: Step,
    pub calendar_event: CalendarEvent,
}

#[derive(Clone)]
pub struct StepService {
    store: DocumentStore,
    events: EventBus,
}

impl StepService {
    pub fn new(store: DocumentStore, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Steps of a parent ordered by scheduled time
    pub async fn list(&self, parent: &ParentRef) -> Result<Vec<Step>> {
        parent.ensure_exists(&self.store).await?;
        let mut steps: Vec<Step> = self.store.list(&parent.steps()).await?;
        steps.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
        Ok(steps)
    }

    pub async fn create(&self, parent: &ParentRef, input: NewStep, now: DateTime<Utc>) -> Result<StepWithEvent> {
        let parent_name = parent.display_name(&self.store).await?;

        let event_id = uuid_utils::generate();
        let step = input.into_step(uuid_utils::generate(), event_id.clone(), now)?;
        let calendar_event = CalendarEvent::for_step(event_id, &step, parent.kind, &parent.id, &parent_name);

        let mut batch = self.store.batch();
        batch.create(&parent.steps(), &step.id, &step)?;
        batch.create(collections::CALENDAR_EVENTS, &calendar_event.id, &calendar_event)?;
        batch.commit(&self.store).await?;

        info!(parent = %parent.id, step = %step.id, "Step created with calendar event");
        self.events.emit_lossy(CrmEvent::StepCreated {
            parent_kind: parent.kind,
            parent_id: parent.id.clone(),
            step_id: step.id.clone(),
            calendar_event_id: calendar_event.id.clone(),
            timestamp: now,
        });

        Ok(StepWithEvent { step, calendar_event })
    }

    /// Partial update; the calendar event follows title and timing changes
    pub async fn update(
        &self,
        parent: &ParentRef,
        step_id: &str,
        updates: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Step> {
        let parent_name = parent.display_name(&self.store).await?;
        let collection = parent.steps();
        let current: Step = self.store.require(&collection, step_id).await?;

        let mut step = apply_json_updates(&current, updates)?;
        if step.calendar_event_id != current.calendar_event_id {
            return Err(Error::InvalidInput("Field 'calendarEventId' cannot be updated".to_string()));
        }
        step.updated_at = now;

        let mut batch = self.store.batch();
        batch.set(&collection, step_id, &step)?;
        if let Some(event_id) = &step.calendar_event_id {
            let existing: Option<CalendarEvent> =
                self.store.get(collections::CALENDAR_EVENTS, event_id).await?;
            let mut event =
                CalendarEvent::for_step(event_id.clone(), &step, parent.kind, &parent.id, &parent_name);
            if let Some(existing) = existing {
                event.created_at = existing.created_at;
            }
            batch.set(collections::CALENDAR_EVENTS, event_id, &event)?;
        }
        batch.commit(&self.store).await?;
        Ok(step)
    }

    pub async fn delete(&self, parent: &ParentRef, step_id: &str) -> Result<()> {
        parent.ensure_exists(&self.store).await?;
        let collection = parent.steps();
        let step: Step = self.store.require(&collection, step_id).await?;

        let mut batch = self.store.batch();
        batch.delete(&collection, step_id);
        if let Some(event_id) = &step.calendar_event_id {
            batch.delete(collections::CALENDAR_EVENTS, event_id);
        }
        batch.commit(&self.store).await?;
        info!(parent = %parent.id, step = step_id, "Step deleted");
        Ok(())
    }
}
