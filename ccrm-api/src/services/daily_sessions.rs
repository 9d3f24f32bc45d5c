//! Daily outreach sessions (calls and WhatsApp)
//!
//! One service instance per channel. Every operation first makes sure the
//! day's session document exists, then applies its change as a single
//! transactional update of that document.

use ccrm_common::events::{CrmEvent, EventBus};
use ccrm_common::models::{DailySession, SessionChannel};
use ccrm_common::{time, DocumentStore, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Session after a change, with the number of ids the change affected
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub session: DailySession,
    pub changed: usize,
}

#[derive(Clone)]
pub struct DailySessionService {
    store: DocumentStore,
    events: EventBus,
    channel: SessionChannel,
}

impl DailySessionService {
    pub fn new(store: DocumentStore, events: EventBus, channel: SessionChannel) -> Self {
        Self { store, events, channel }
    }

    pub fn channel(&self) -> SessionChannel {
        self.channel
    }

    /// The session for `day`, created empty on first access
    pub async fn get_or_create(&self, day: NaiveDate, now: DateTime<Utc>) -> Result<DailySession> {
        let collection = self.channel.collection();
        let key = time::day_key(day);
        let fresh = DailySession::new(self.channel, day, now);
        if self.store.create_if_absent(collection, &key, &fresh).await? {
            info!(channel = self.channel.label(), day = %key, "Daily session created");
        }
        self.store.require(collection, &key).await
    }

    pub async fn select(&self, day: NaiveDate, ids: &[String], now: DateTime<Utc>) -> Result<SessionChange> {
        self.apply(day, now, "select", |s| s.select(ids, now)).await
    }

    pub async fn move_to_completed(
        &self,
        day: NaiveDate,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<SessionChange> {
        self.apply(day, now, "move-to-completed", |s| s.move_to_completed(ids, now))
            .await
    }

    pub async fn move_to_suggested(
        &self,
        day: NaiveDate,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<SessionChange> {
        self.apply(day, now, "move-to-suggested", |s| s.move_to_suggested(ids, now))
            .await
    }

    pub async fn remove(&self, day: NaiveDate, ids: &[String], now: DateTime<Utc>) -> Result<SessionChange> {
        self.apply(day, now, "remove", |s| s.remove(ids, now)).await
    }

    pub async fn set_scores(
        &self,
        day: NaiveDate,
        scores: &BTreeMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Result<SessionChange> {
        self.apply(day, now, "scores", |s| {
            s.set_scores(scores, now);
            scores.len()
        })
        .await
    }

    /// Reset the day's session to empty, keeping its identity
    pub async fn clear(&self, day: NaiveDate, now: DateTime<Utc>) -> Result<DailySession> {
        let change = self
            .apply(day, now, "clear", |s| {
                let had = s.entries.len();
                s.clear(now);
                had
            })
            .await?;
        Ok(change.session)
    }

    async fn apply<F>(&self, day: NaiveDate, now: DateTime<Utc>, action: &str, f: F) -> Result<SessionChange>
    where
        F: FnOnce(&mut DailySession) -> usize + Send,
    {
        self.get_or_create(day, now).await?;

        let mut changed = 0;
        let session = self
            .store
            .modify(self.channel.collection(), &time::day_key(day), |s: &mut DailySession| {
                changed = f(s);
                Ok(())
            })
            .await?;

        debug!(channel = self.channel.label(), action, changed, "Daily session updated");
        self.events.emit_lossy(CrmEvent::SessionUpdated {
            channel: self.channel,
            date: day,
            action: action.to_string(),
            timestamp: now,
        });

        Ok(SessionChange { session, changed })
    }
}
