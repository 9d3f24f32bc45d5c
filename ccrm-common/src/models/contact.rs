//! People at a call center or prospect (subcollection `contacts`)

use super::required_text;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
    /// Free-form rapport notes: family, hobbies, preferred call times
    #[serde(default)]
    pub personal_details: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub personal_details: Map<String, Value>,
}

impl NewContact {
    pub fn into_contact(self, id: String, now: DateTime<Utc>) -> Result<Contact> {
        Ok(Contact {
            id,
            name: required_text("name", &self.name)?,
            role: self.role.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            notes: self.notes,
            personal_details: self.personal_details,
            created_at: now,
            updated_at: now,
        })
    }
}
