//! Follow-up tasks produced by schedule generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    Call,
    Email,
}

/// A dated follow-up for one user (collection `scheduledTasks`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub id: String,
    pub user_id: String,
    pub call_center_id: String,
    pub call_center_name: String,
    pub title: String,
    pub kind: TaskKind,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Reminder for a task due soon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub task_id: String,
    pub message: String,
    pub due_at: DateTime<Utc>,
}
