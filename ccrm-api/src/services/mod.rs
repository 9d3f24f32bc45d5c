//! Domain services
//!
//! Each service owns clones of the store handle (and the event bus where it
//! emits), so handlers build them per request from `AppState`.

pub mod calendar;
pub mod contacts;
pub mod daily_sessions;
pub mod duplicates;
pub mod external_crm;
pub mod prospection;
pub mod scheduling;
pub mod steps;
pub mod suggestions;

pub use calendar::CalendarService;
pub use contacts::ContactService;
pub use daily_sessions::{DailySessionService, SessionChange};
pub use duplicates::DuplicateDetectionService;
pub use external_crm::{CallCenterFilter, ExternalCrmService, ImportSummary};
pub use prospection::ProspectionService;
pub use scheduling::{ScheduleReport, SchedulingService};
pub use steps::{StepService, StepWithEvent};
pub use suggestions::SuggestionService;

use ccrm_common::models::ParentKind;
use ccrm_common::store::{collections, subcollection};
use ccrm_common::{DocumentStore, Error, Result};
use serde::Serialize;
use tracing::error;

/// One id that a bulk operation could not process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

/// Per-id result of a bulk operation
///
/// Every id is attempted; one failure never stops the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn record(&mut self, id: &str, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(id.to_string()),
            Err(err) => self.failed.push(BulkFailure {
                id: id.to_string(),
                error: failure_message(&err),
            }),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }
}

/// Client-facing text for a per-id failure
fn failure_message(err: &Error) -> String {
    match err {
        Error::NotFound(_) => "not found".to_string(),
        Error::InvalidInput(msg) => msg.clone(),
        other => {
            error!("Bulk operation item failed: {}", other);
            "internal error".to_string()
        }
    }
}

/// The call center or prospect owning a subcollection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: String,
}

impl ParentRef {
    pub fn call_center(id: impl Into<String>) -> Self {
        Self {
            kind: ParentKind::CallCenter,
            id: id.into(),
        }
    }

    pub fn prospect(id: impl Into<String>) -> Self {
        Self {
            kind: ParentKind::Prospect,
            id: id.into(),
        }
    }

    pub fn child_collection(&self, name: &str) -> String {
        subcollection(self.kind.collection(), &self.id, name)
    }

    pub fn contacts(&self) -> String {
        self.child_collection(collections::CONTACTS)
    }

    pub fn steps(&self) -> String {
        self.child_collection(collections::STEPS)
    }

    /// Fail with `NotFound` unless the parent document exists
    pub async fn ensure_exists(&self, store: &DocumentStore) -> Result<()> {
        if store.exists(self.kind.collection(), &self.id).await? {
            Ok(())
        } else {
            Err(Error::not_found(self.kind.collection(), &self.id))
        }
    }

    /// Display name of the parent (its `name` field)
    pub async fn display_name(&self, store: &DocumentStore) -> Result<String> {
        let doc = store
            .get_raw(self.kind.collection(), &self.id)
            .await?
            .ok_or_else(|| Error::not_found(self.kind.collection(), &self.id))?;
        Ok(doc
            .data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id)
            .to_string())
    }
}
