//! Daily outreach sessions
//!
//! One document per channel per calendar day, id = `YYYY-MM-DD`. Each call
//! center in the session has exactly one entry carrying its stage, so a move
//! between "suggested" and "completed" is a single field change on a single
//! document.

use crate::store::collections;
use crate::time::day_key;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outreach channel of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionChannel {
    Calls,
    Whatsapp,
}

impl SessionChannel {
    pub fn collection(self) -> &'static str {
        match self {
            SessionChannel::Calls => collections::DAILY_CALL_SESSIONS,
            SessionChannel::Whatsapp => collections::DAILY_WHATSAPP_SESSIONS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionChannel::Calls => "calls",
            SessionChannel::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutreachStage {
    /// Selected for today, not yet reached
    Suggested,
    /// Called / message sent
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachEntry {
    pub stage: OutreachStage,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySession {
    pub id: String,
    pub date: NaiveDate,
    pub channel: SessionChannel,
    /// Call center id -> stage
    #[serde(default)]
    pub entries: BTreeMap<String, OutreachEntry>,
    /// Call center id -> priority score
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySession {
    pub fn new(channel: SessionChannel, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: day_key(date),
            date,
            channel,
            entries: BTreeMap::new(),
            scores: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add ids as suggested; ids already in the session keep their stage
    pub fn select(&mut self, ids: &[String], now: DateTime<Utc>) -> usize {
        let mut added = 0;
        for id in ids {
            if !self.entries.contains_key(id) {
                self.entries.insert(
                    id.clone(),
                    OutreachEntry {
                        stage: OutreachStage::Suggested,
                        changed_at: now,
                    },
                );
                added += 1;
            }
        }
        self.touch(now, added);
        added
    }

    /// Mark ids completed; returns how many changed stage
    ///
    /// Ids not yet in the session are added directly as completed.
    pub fn move_to_completed(&mut self, ids: &[String], now: DateTime<Utc>) -> usize {
        let mut moved = 0;
        for id in ids {
            let entry = self.entries.entry(id.clone()).or_insert(OutreachEntry {
                stage: OutreachStage::Suggested,
                changed_at: now,
            });
            if entry.stage != OutreachStage::Completed {
                entry.stage = OutreachStage::Completed;
                entry.changed_at = now;
                moved += 1;
            }
        }
        self.touch(now, moved);
        moved
    }

    /// Return completed ids to suggested; ids in any other state are ignored
    pub fn move_to_suggested(&mut self, ids: &[String], now: DateTime<Utc>) -> usize {
        let mut moved = 0;
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                if entry.stage == OutreachStage::Completed {
                    entry.stage = OutreachStage::Suggested;
                    entry.changed_at = now;
                    moved += 1;
                }
            }
        }
        self.touch(now, moved);
        moved
    }

    /// Drop ids (and their scores) from the session
    pub fn remove(&mut self, ids: &[String], now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.entries.remove(id).is_some() {
                removed += 1;
            }
            self.scores.remove(id);
        }
        self.touch(now, removed);
        removed
    }

    /// Merge scores into the score map
    pub fn set_scores(&mut self, scores: &BTreeMap<String, f64>, now: DateTime<Utc>) {
        for (id, score) in scores {
            self.scores.insert(id.clone(), *score);
        }
        self.touch(now, scores.len());
    }

    /// Reset to the empty state; id and creation time are kept
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.entries.clear();
        self.scores.clear();
        self.updated_at = now;
    }

    pub fn ids_in(&self, stage: OutreachStage) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.stage == stage)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn touch(&mut self, now: DateTime<Utc>, changes: usize) {
        if changes > 0 {
            self.updated_at = now;
        }
    }
}

/// HTTP view of a session with the per-stage id lists spelled out
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySessionView {
    #[serde(flatten)]
    pub session: DailySession,
    pub suggested_ids: Vec<String>,
    pub completed_ids: Vec<String>,
}

impl From<DailySession> for DailySessionView {
    fn from(session: DailySession) -> Self {
        Self {
            suggested_ids: session.ids_in(OutreachStage::Suggested),
            completed_ids: session.ids_in(OutreachStage::Completed),
            session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn session() -> DailySession {
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        DailySession::new(SessionChannel::Whatsapp, day, Utc::now())
    }

    #[test]
    fn test_new_session_is_keyed_by_day() {
        let s = session();
        assert_eq!(s.id, "2024-04-02");
        assert!(s.entries.is_empty());
    }

    #[test]
    fn test_select_does_not_reset_completed() {
        let mut s = session();
        assert_eq!(s.select(&ids(&["a", "b"]), Utc::now()), 2);
        s.move_to_completed(&ids(&["a"]), Utc::now());
        assert_eq!(s.select(&ids(&["a", "c"]), Utc::now()), 1);
        assert_eq!(s.ids_in(OutreachStage::Completed), ids(&["a"]));
        assert_eq!(s.ids_in(OutreachStage::Suggested), ids(&["b", "c"]));
    }

    #[test]
    fn test_move_round_trip_restores_suggestions() {
        let mut s = session();
        s.select(&ids(&["a", "b", "c"]), Utc::now());
        let original = s.ids_in(OutreachStage::Suggested);

        assert_eq!(s.move_to_completed(&ids(&["a", "b"]), Utc::now()), 2);
        assert_eq!(s.ids_in(OutreachStage::Suggested), ids(&["c"]));

        assert_eq!(s.move_to_suggested(&ids(&["a", "b"]), Utc::now()), 2);
        assert_eq!(s.ids_in(OutreachStage::Suggested), original);
    }

    #[test]
    fn test_moves_count_only_transitions() {
        let mut s = session();
        s.select(&ids(&["a"]), Utc::now());
        assert_eq!(s.move_to_completed(&ids(&["a", "a"]), Utc::now()), 1);
        assert_eq!(s.move_to_suggested(&ids(&["zzz"]), Utc::now()), 0);
        // Unknown id goes straight to completed
        assert_eq!(s.move_to_completed(&ids(&["new"]), Utc::now()), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut s = session();
        s.select(&ids(&["a", "b"]), Utc::now());
        s.set_scores(&[("a".to_string(), 2.5)].into_iter().collect(), Utc::now());
        assert_eq!(s.remove(&ids(&["a", "x"]), Utc::now()), 1);
        assert!(s.scores.is_empty());

        let created = s.created_at;
        s.clear(Utc::now());
        assert!(s.entries.is_empty());
        assert_eq!(s.created_at, created);
        assert_eq!(s.id, "2024-04-02");
    }

    #[test]
    fn test_view_lists_stages() {
        let mut s = session();
        s.select(&ids(&["a", "b"]), Utc::now());
        s.move_to_completed(&ids(&["b"]), Utc::now());
        let view = DailySessionView::from(s);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["suggestedIds"], serde_json::json!(["a"]));
        assert_eq!(json["completedIds"], serde_json::json!(["b"]));
        assert_eq!(json["channel"], "whatsapp");
        assert_eq!(json["id"], "2024-04-02");
    }
}
