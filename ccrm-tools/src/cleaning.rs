//! Normalisation of raw exported call center records
//!
//! Exports come from spreadsheets and older CRM dumps, so field names and
//! shapes vary: phones may be a single string with separators or an array,
//! statuses use free-form spellings, and the same call center can appear
//! several times. The output is a list of `NewCallCenter` ready for staging.

use ccrm_common::models::{CallCenterStatus, NewCallCenter};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Characters separating several values packed in one string
const LIST_SEPARATORS: &[char] = &[',', ';', '/', '|', '\n'];

/// Result of a cleaning pass
#[derive(Debug, Default)]
pub struct CleanReport {
    pub records: Vec<NewCallCenter>,
    /// Records without a usable name
    pub dropped: usize,
    /// Records folded into an earlier record with the same key
    pub merged: usize,
    /// Records whose status spelling was not recognised (kept as New)
    pub unknown_status: usize,
}

/// Clean a list of raw records
///
/// Non-object entries count as dropped.
pub fn clean_records(raw: &[Value]) -> CleanReport {
    let mut report = CleanReport::default();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for (position, value) in raw.iter().enumerate() {
        let Some(object) = value.as_object() else {
            debug!(position, "Skipping non-object record");
            report.dropped += 1;
            continue;
        };

        let (record, status_known) = normalize_record(object);
        if record.name.is_empty() {
            report.dropped += 1;
            continue;
        }
        if !status_known {
            report.unknown_status += 1;
        }

        let key = merge_key(&record);
        match index_by_key.get(&key) {
            Some(&existing) => {
                merge_into(&mut report.records[existing], record);
                report.merged += 1;
            }
            None => {
                index_by_key.insert(key, report.records.len());
                report.records.push(record);
            }
        }
    }

    report
}

/// Normalise one record; the flag is false when a status was given but not recognised
fn normalize_record(object: &Map<String, Value>) -> (NewCallCenter, bool) {
    let raw_status = text_field(object, &["status", "Status", "state"]);
    let status = CallCenterStatus::parse_loose(&raw_status);
    if status.is_none() {
        warn!(status = %raw_status, "Unrecognised status, using New");
    }

    let mut emails = list_field(object, &["emails", "email", "Email", "mail"]);
    for email in &mut emails {
        *email = email.to_lowercase();
    }
    dedupe(&mut emails);

    let mut phones = list_field(object, &["phones", "phone", "Phone", "telephone", "tel"]);
    dedupe(&mut phones);

    let mut tags = list_field(object, &["tags", "Tags"]);
    dedupe(&mut tags);

    let record = NewCallCenter {
        name: collapse(&text_field(object, &["name", "Name", "company", "companyName"])),
        country: collapse(&text_field(object, &["country", "Country", "pays"])),
        city: collapse(&text_field(object, &["city", "City", "ville"])),
        positions: positions_field(object),
        status: status.unwrap_or_default(),
        phones,
        emails,
        website: text_field(object, &["website", "Website", "site", "url"]),
        address: collapse(&text_field(object, &["address", "Address", "adresse"])),
        tags,
        notes: text_field(object, &["notes", "Notes", "comment", "comments"]),
        last_contacted: None,
    };

    (record, status.is_some())
}

/// Normalised name + country + city
pub fn merge_key(record: &NewCallCenter) -> String {
    format!(
        "{}|{}|{}",
        record.name.to_lowercase(),
        record.country.to_lowercase(),
        record.city.to_lowercase()
    )
}

/// Fold `other` into `target`: lists are unioned, blank scalars filled in
fn merge_into(target: &mut NewCallCenter, other: NewCallCenter) {
    for phone in other.phones {
        if !target.phones.contains(&phone) {
            target.phones.push(phone);
        }
    }
    for email in other.emails {
        if !target.emails.contains(&email) {
            target.emails.push(email);
        }
    }
    for tag in other.tags {
        if !target.tags.contains(&tag) {
            target.tags.push(tag);
        }
    }
    if target.website.is_empty() {
        target.website = other.website;
    }
    if target.address.is_empty() {
        target.address = other.address;
    }
    if !other.notes.is_empty() && !target.notes.contains(&other.notes) {
        if target.notes.is_empty() {
            target.notes = other.notes;
        } else {
            target.notes = format!("{}\n{}", target.notes, other.notes);
        }
    }
    target.positions = target.positions.max(other.positions);
    if target.status == CallCenterStatus::New {
        target.status = other.status;
    }
}

/// First present key rendered as trimmed text
fn text_field(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match object.get(*key) {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Values of every present key, strings split on separators
fn list_field(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for key in keys {
        match object.get(*key) {
            Some(Value::String(s)) => out.extend(split_values(s)),
            Some(Value::Number(n)) => out.push(n.to_string()),
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(s) => out.extend(split_values(s)),
                        Value::Number(n) => out.push(n.to_string()),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    out
}

pub fn split_values(raw: &str) -> Vec<String> {
    raw.split(LIST_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn positions_field(object: &Map<String, Value>) -> u32 {
    for key in ["positions", "Positions", "seats", "agents"] {
        match object.get(key) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    return u32::try_from(v).unwrap_or(u32::MAX);
                }
            }
            Some(Value::String(s)) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                if let Ok(v) = digits.parse::<u32>() {
                    return v;
                }
            }
            _ => {}
        }
    }
    0
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dedupe(values: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(v.clone());
            true
        }
    });
}
