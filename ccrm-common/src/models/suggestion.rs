//! Proposed call centers awaiting acceptance

use super::NewCallCenter;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    /// The call center that would be created on acceptance
    pub call_center: NewCallCenter,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSuggestion {
    pub call_center: NewCallCenter,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score: Option<f64>,
}

impl NewSuggestion {
    pub fn into_suggestion(self, id: String, now: DateTime<Utc>) -> Result<Suggestion> {
        if self.call_center.name.trim().is_empty() {
            return Err(Error::InvalidInput("callCenter.name is required".to_string()));
        }
        if let Some(score) = self.score {
            if !score.is_finite() {
                return Err(Error::InvalidInput("score must be a finite number".to_string()));
            }
        }
        Ok(Suggestion {
            id,
            call_center: self.call_center,
            reason: self.reason.trim().to_string(),
            score: self.score,
            created_at: now,
        })
    }
}
