//! Calendar view over step events

use ccrm_common::models::CalendarEvent;
use ccrm_common::store::collections;
use ccrm_common::{DocumentStore, Error, Result};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct CalendarService {
    store: DocumentStore,
}

impl CalendarService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Events overlapping `[from, to)`, ordered by start
    pub async fn list(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>> {
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Err(Error::InvalidInput("from must be earlier than to".to_string()));
            }
        }

        let mut events: Vec<CalendarEvent> = self
            .store
            .list::<CalendarEvent>(collections::CALENDAR_EVENTS)
            .await?
            .into_iter()
            .filter(|event| event.overlaps(from, to))
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }
}
