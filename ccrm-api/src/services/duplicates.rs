//! Duplicate call center detection
//!
//! Matching is exact after normalisation and driven by `DuplicatePolicy`.
//! Names and locations have whitespace collapsed and (unless the policy is
//! case-sensitive) are lowercased. Phones compare by their digits.

use ccrm_common::config::DuplicatePolicy;
use ccrm_common::models::{CallCenter, NewCallCenter};
use ccrm_common::store::collections;
use ccrm_common::{DocumentStore, Result};
use tracing::debug;

/// Phone numbers shorter than this (in digits) never match
const MIN_PHONE_DIGITS: usize = 6;

/// Normalised comparison key of one call center
#[derive(Debug, Clone, PartialEq)]
pub struct MatchKey {
    name_location: Option<(String, String, String)>,
    phones: Vec<String>,
}

impl MatchKey {
    pub fn build(
        policy: &DuplicatePolicy,
        name: &str,
        country: &str,
        city: &str,
        phones: &[String],
    ) -> Self {
        let name_location = if policy.match_name_location {
            let name = normalize_text(name, policy.case_sensitive);
            (!name.is_empty()).then(|| {
                (
                    name,
                    normalize_text(country, policy.case_sensitive),
                    normalize_text(city, policy.case_sensitive),
                )
            })
        } else {
            None
        };

        let phones = if policy.match_phones {
            phones
                .iter()
                .map(|p| phone_digits(p))
                .filter(|d| d.len() >= MIN_PHONE_DIGITS)
                .collect()
        } else {
            Vec::new()
        };

        Self { name_location, phones }
    }

    pub fn for_call_center(policy: &DuplicatePolicy, cc: &CallCenter) -> Self {
        Self::build(policy, &cc.name, &cc.country, &cc.city, &cc.phones)
    }

    pub fn for_candidate(policy: &DuplicatePolicy, cc: &NewCallCenter) -> Self {
        Self::build(policy, &cc.name, &cc.country, &cc.city, &cc.phones)
    }

    pub fn matches(&self, other: &MatchKey) -> bool {
        let same_place = match (&self.name_location, &other.name_location) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        same_place || self.phones.iter().any(|p| other.phones.contains(p))
    }
}

/// Trim, collapse inner whitespace, optionally lowercase
pub fn normalize_text(value: &str, case_sensitive: bool) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_lowercase()
    }
}

pub fn phone_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[derive(Clone)]
pub struct DuplicateDetectionService {
    store: DocumentStore,
    policy: DuplicatePolicy,
}

impl DuplicateDetectionService {
    pub fn new(store: DocumentStore, policy: DuplicatePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &DuplicatePolicy {
        &self.policy
    }

    /// Existing call centers that duplicate `candidate`
    pub async fn find_duplicates(&self, candidate: &NewCallCenter) -> Result<Vec<CallCenter>> {
        let key = MatchKey::for_candidate(&self.policy, candidate);
        debug!(
            name = %candidate.name,
            country = %candidate.country,
            city = %candidate.city,
            "Checking for duplicate call centers"
        );

        let existing: Vec<CallCenter> = self.store.list(collections::CALL_CENTERS).await?;
        Ok(existing
            .into_iter()
            .filter(|cc| MatchKey::for_call_center(&self.policy, cc).matches(&key))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(policy: &DuplicatePolicy, name: &str, city: &str, phones: &[&str]) -> MatchKey {
        let phones: Vec<String> = phones.iter().map(|p| p.to_string()).collect();
        MatchKey::build(policy, name, "France", city, &phones)
    }

    #[test]
    fn test_default_policy_ignores_case_and_spacing() {
        let policy = DuplicatePolicy::default();
        let a = key(&policy, "Acme  Calls", "Paris", &[]);
        let b = key(&policy, " acme calls ", "PARIS", &[]);
        assert!(a.matches(&b));
        assert!(!a.matches(&key(&policy, "Acme Calls", "Lyon", &[])));
    }

    #[test]
    fn test_shared_phone_matches_across_formats() {
        let policy = DuplicatePolicy::default();
        let a = key(&policy, "One", "Paris", &["+33 1 23 45 67 89"]);
        let b = key(&policy, "Two", "Lyon", &["+33-1-23-45-67-89", "555"]);
        assert!(a.matches(&b));
    }

    #[test]
    fn test_short_phone_fragments_never_match() {
        let policy = DuplicatePolicy::default();
        let a = key(&policy, "One", "Paris", &["112"]);
        let b = key(&policy, "Two", "Lyon", &["112"]);
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_policy_switches() {
        let names_only = DuplicatePolicy {
            match_phones: false,
            ..Default::default()
        };
        let a = key(&names_only, "One", "Paris", &["0123456789"]);
        let b = key(&names_only, "Two", "Paris", &["0123456789"]);
        assert!(!a.matches(&b));

        let strict = DuplicatePolicy {
            case_sensitive: true,
            ..Default::default()
        };
        assert!(!key(&strict, "Acme", "Paris", &[]).matches(&key(&strict, "ACME", "Paris", &[])));
    }
}
