//! Event types for in-process notifications
//!
//! Services emit `CrmEvent`s on an `EventBus` owned by the application state;
//! the SSE endpoint and any other listener subscribe to it. The bus is
//! constructed by the entry point and passed down, never held globally.

use crate::models::{ParentKind, SessionChannel};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// CRM event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CrmEvent {
    /// Call centers were created through a bulk import
    CallCentersImported { count: usize, timestamp: DateTime<Utc> },

    /// Call centers were deleted (bulk delete or delete-all)
    CallCentersDeleted { count: usize, timestamp: DateTime<Utc> },

    /// A suggestion was promoted to a call center
    SuggestionAccepted {
        suggestion_id: String,
        call_center_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A daily outreach session changed
    SessionUpdated {
        channel: SessionChannel,
        date: NaiveDate,
        /// Short verb: "select", "move-to-completed", "clear", ...
        action: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline step (and its calendar entry) was created
    StepCreated {
        parent_kind: ParentKind,
        parent_id: String,
        step_id: String,
        calendar_event_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A schedule was (re)generated for a user
    ScheduleGenerated {
        user_id: String,
        task_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A scheduled task is due soon
    TaskDue {
        task_id: String,
        user_id: String,
        call_center_id: String,
        message: String,
        due_at: DateTime<Utc>,
    },
}

impl CrmEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            CrmEvent::CallCentersImported { .. } => "CallCentersImported",
            CrmEvent::CallCentersDeleted { .. } => "CallCentersDeleted",
            CrmEvent::SuggestionAccepted { .. } => "SuggestionAccepted",
            CrmEvent::SessionUpdated { .. } => "SessionUpdated",
            CrmEvent::StepCreated { .. } => "StepCreated",
            CrmEvent::ScheduleGenerated { .. } => "ScheduleGenerated",
            CrmEvent::TaskDue { .. } => "TaskDue",
        }
    }
}

/// Broadcast bus for `CrmEvent`s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CrmEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CrmEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; `Err` if nobody is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CrmEvent) -> Result<usize, broadcast::error::SendError<CrmEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CrmEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event dropped: no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
