//! Call center leads

use super::{clean_list, required_text};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline status of a call center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallCenterStatus {
    #[default]
    New,
    Contacted,
    Interested,
    Callback,
    NotInterested,
    Closed,
}

impl CallCenterStatus {
    /// Lenient parse for imported data ("not interested", "call-back", "NEW", ...)
    pub fn parse_loose(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "new" | "" => Some(Self::New),
            "contacted" | "called" | "reached" => Some(Self::Contacted),
            "interested" | "hot" => Some(Self::Interested),
            "callback" | "recall" => Some(Self::Callback),
            "notinterested" | "rejected" | "refused" => Some(Self::NotInterested),
            "closed" | "done" | "won" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Statuses that still need outreach
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::New | Self::Contacted | Self::Interested | Self::Callback
        )
    }
}

/// A call center lead document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCenter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    /// Number of agent seats
    #[serde(default)]
    pub positions: u32,
    #[serde(default)]
    pub status: CallCenterStatus,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub last_contacted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallCenter {
    /// Add a tag unless already present; returns true if added
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// True if there is any way to reach this call center
    pub fn is_reachable(&self) -> bool {
        !self.phones.is_empty() || !self.emails.is_empty()
    }
}

/// Create / import payload for a call center
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCallCenter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub positions: u32,
    #[serde(default)]
    pub status: CallCenterStatus,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub last_contacted: Option<DateTime<Utc>>,
}

impl NewCallCenter {
    /// Validate and build the stored document
    pub fn into_call_center(self, id: String, now: DateTime<Utc>) -> Result<CallCenter> {
        Ok(CallCenter {
            id,
            name: required_text("name", &self.name)?,
            country: self.country.trim().to_string(),
            city: self.city.trim().to_string(),
            positions: self.positions,
            status: self.status,
            phones: clean_list(self.phones),
            emails: clean_list(self.emails),
            website: self.website.trim().to_string(),
            address: self.address.trim().to_string(),
            tags: clean_list(self.tags),
            notes: self.notes,
            last_contacted: self.last_contacted,
            created_at: now,
            updated_at: now,
        })
    }
}
