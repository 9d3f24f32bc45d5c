//! Domain models
//!
//! All documents and HTTP bodies use camelCase field names.

mod call_center;
mod contact;
mod prospect;
mod schedule;
mod session;
mod step;
mod suggestion;

pub use call_center::{CallCenter, CallCenterStatus, NewCallCenter};
pub use contact::{Contact, NewContact};
pub use prospect::{CallLog, CallOutcome, NewCallLog, NewProspect, Prospect, ProspectStatus};
pub use schedule::{Notification, ScheduledTask, TaskKind};
pub use session::{DailySession, DailySessionView, OutreachEntry, OutreachStage, SessionChannel};
pub use step::{CalendarEvent, NewStep, ParentKind, Step, StepKind};
pub use suggestion::{NewSuggestion, Suggestion};

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields no partial update may touch
const PROTECTED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Apply a partial JSON update to a model
///
/// Each key replaces the top-level field of the same name. Unknown and
/// protected fields are rejected, and the merged document must still
/// deserialize as `T`, so a bad enum value fails the whole update.
pub fn apply_json_updates<T>(doc: &T, updates: &Map<String, Value>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(doc)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| Error::Internal("Model did not serialize to an object".to_string()))?;

    for (key, new_value) in updates {
        if PROTECTED_FIELDS.contains(&key.as_str()) {
            return Err(Error::InvalidInput(format!("Field '{}' cannot be updated", key)));
        }
        if !object.contains_key(key) {
            return Err(Error::InvalidInput(format!("Unknown field: {}", key)));
        }
        object.insert(key.clone(), new_value.clone());
    }

    serde_json::from_value(value).map_err(|e| Error::InvalidInput(format!("Invalid update: {}", e)))
}

/// Trim and require a non-blank value
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim every entry, drop blanks and exact repeats (first occurrence wins)
pub(crate) fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
