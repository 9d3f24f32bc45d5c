//! Prospection pipeline leads and their call logs

use super::{clean_list, required_text};
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProspectStatus {
    #[default]
    New,
    Contacted,
    Interested,
    NotInterested,
    Converted,
}

/// A prospect document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub status: ProspectStatus,
    /// Where the lead came from ("import", "manual", ...)
    #[serde(default)]
    pub source: String,
    /// Day of the import batch that created this prospect
    #[serde(default)]
    pub import_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_contacted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prospect {
    /// Account for one outreach call
    ///
    /// `lastContacted` only moves forward; a first call promotes a new
    /// prospect to contacted.
    pub fn record_call(&mut self, called_at: DateTime<Utc>) {
        self.contact_attempts += 1;
        if self.last_contacted.map_or(true, |last| called_at > last) {
            self.last_contacted = Some(called_at);
        }
        if self.status == ProspectStatus::New {
            self.status = ProspectStatus::Contacted;
        }
    }
}

/// Create / import payload for a prospect
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProspect {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub status: ProspectStatus,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProspect {
    pub fn into_prospect(
        self,
        id: String,
        import_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Prospect> {
        Ok(Prospect {
            id,
            name: required_text("name", &self.name)?,
            company: self.company.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            country: self.country.trim().to_string(),
            city: self.city.trim().to_string(),
            status: self.status,
            source: self.source.trim().to_string(),
            import_date,
            notes: self.notes,
            tags: clean_list(self.tags),
            last_contacted: None,
            contact_attempts: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallOutcome {
    Answered,
    NoAnswer,
    Voicemail,
    Busy,
    WrongNumber,
    Callback,
}

/// One logged call, stored in the prospect's `calls` subcollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: String,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub notes: String,
    pub called_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCallLog {
    pub outcome: CallOutcome,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub notes: String,
    /// Defaults to now
    #[serde(default)]
    pub called_at: Option<DateTime<Utc>>,
}

impl NewCallLog {
    pub fn into_call_log(self, id: String, now: DateTime<Utc>) -> CallLog {
        CallLog {
            id,
            outcome: self.outcome,
            duration_seconds: self.duration_seconds,
            notes: self.notes,
            called_at: self.called_at.unwrap_or(now),
        }
    }
}
