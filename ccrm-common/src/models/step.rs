//! Pipeline steps and the calendar entries they produce

use super::required_text;
use crate::store::collections;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which entity family owns a subcollection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentKind {
    CallCenter,
    Prospect,
}

impl ParentKind {
    pub fn collection(self) -> &'static str {
        match self {
            ParentKind::CallCenter => collections::CALL_CENTERS,
            ParentKind::Prospect => collections::PROSPECTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    Call,
    Whatsapp,
    Email,
    Meeting,
    #[default]
    FollowUp,
}

/// A planned pipeline action (subcollection `steps`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: StepKind,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_duration_minutes() -> u32 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: StepKind,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: String,
}

impl NewStep {
    pub fn into_step(self, id: String, calendar_event_id: String, now: DateTime<Utc>) -> Result<Step> {
        Ok(Step {
            id,
            title: required_text("title", &self.title)?,
            kind: self.kind,
            scheduled_for: self.scheduled_for,
            duration_minutes: self.duration_minutes.max(1),
            notes: self.notes,
            completed: false,
            calendar_event_id: Some(calendar_event_id),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Calendar entry mirroring a step (collection `calendarEvents`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub parent_kind: ParentKind,
    pub parent_id: String,
    pub step_id: String,
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Calendar entry for `step`, titled after the owning entity
    pub fn for_step(
        id: String,
        step: &Step,
        parent_kind: ParentKind,
        parent_id: &str,
        parent_name: &str,
    ) -> Self {
        Self {
            id,
            title: format!("{} - {}", step.title, parent_name),
            start: step.scheduled_for,
            end: step.scheduled_for + Duration::minutes(i64::from(step.duration_minutes)),
            parent_kind,
            parent_id: parent_id.to_string(),
            step_id: step.id.clone(),
            created_at: step.created_at,
        }
    }

    /// True if the event overlaps `[from, to)`; open bounds are unbounded
    pub fn overlaps(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
        from.map_or(true, |from| self.end > from) && to.map_or(true, |to| self.start < to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn step() -> Step {
        NewStep {
            title: "Call back".to_string(),
            kind: StepKind::Call,
            scheduled_for: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
            duration_minutes: 45,
            notes: String::new(),
        }
        .into_step("s1".to_string(), "e1".to_string(), Utc::now())
        .unwrap()
    }

    #[test]
    fn test_calendar_event_spans_step_duration() {
        let event = CalendarEvent::for_step("e1".to_string(), &step(), ParentKind::CallCenter, "c1", "Acme");
        assert_eq!(event.title, "Call back - Acme");
        assert_eq!(event.end - event.start, Duration::minutes(45));
        assert_eq!(event.step_id, "s1");
    }

    #[test]
    fn test_overlaps_window() {
        let event = CalendarEvent::for_step("e1".to_string(), &step(), ParentKind::Prospect, "p1", "Lead");
        let day = |h| Utc.with_ymd_and_hms(2024, 6, 3, h, 0, 0).unwrap();
        assert!(event.overlaps(None, None));
        assert!(event.overlaps(Some(day(8)), Some(day(10))));
        assert!(!event.overlaps(Some(day(10)), None));
        assert!(!event.overlaps(None, Some(day(9))));
    }

    #[test]
    fn test_parent_kind_collections() {
        assert_eq!(ParentKind::CallCenter.collection(), "callCenters");
        assert_eq!(ParentKind::Prospect.collection(), "prospects");
    }
}
