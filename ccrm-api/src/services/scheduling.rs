//! Follow-up task generation
//!
//! Builds a call/email follow-up for every call center still in the
//! pipeline. Due times come from the status-specific delay after the last
//! contact (or creation) and are never earlier than the next whole hour.

use ccrm_common::config::SchedulingConfig;
use ccrm_common::events::{CrmEvent, EventBus};
use ccrm_common::models::{CallCenter, CallCenterStatus, Notification, ScheduledTask, TaskKind};
use ccrm_common::store::collections;
use ccrm_common::{time, uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of one schedule generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub task_count: usize,
    pub warnings: Vec<String>,
    pub notifications: Vec<Notification>,
    #[serde(skip)]
    pub tasks: Vec<ScheduledTask>,
}

#[derive(Clone)]
pub struct SchedulingService {
    store: DocumentStore,
    events: EventBus,
    config: SchedulingConfig,
}

impl SchedulingService {
    pub fn new(store: DocumentStore, events: EventBus, config: SchedulingConfig) -> Self {
        Self { store, events, config }
    }

    /// Follow-up delay for a status; `None` for closed pipelines
    fn delay_for(&self, status: CallCenterStatus) -> Result<Option<Duration>> {
        let c = &self.config;
        let delay = match status {
            CallCenterStatus::New => Duration::try_hours(c.new_delay_hours),
            CallCenterStatus::Contacted => Duration::try_days(c.contacted_delay_days),
            CallCenterStatus::Interested => Duration::try_days(c.interested_delay_days),
            CallCenterStatus::Callback => Duration::try_days(c.callback_delay_days),
            CallCenterStatus::NotInterested | CallCenterStatus::Closed => return Ok(None),
        };
        delay
            .map(Some)
            .ok_or_else(|| Error::Config(format!("Follow-up delay for {:?} is out of range", status)))
    }

    /// Replace `user_id`'s tasks with a freshly generated schedule
    pub async fn generate_test_schedule(&self, user_id: &str, now: DateTime<Utc>) -> Result<ScheduleReport> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("userId is required".to_string()));
        }

        let call_centers: Vec<CallCenter> = self.store.list(collections::CALL_CENTERS).await?;
        let earliest = time::next_whole_hour(now);
        let mut warnings = Vec::new();
        let mut tasks = Vec::new();

        for cc in &call_centers {
            let Some(delay) = self.delay_for(cc.status)? else {
                continue;
            };
            if !cc.is_reachable() {
                warnings.push(format!("Skipped {} ({}): no phone or email", cc.name, cc.id));
                continue;
            }

            let base = cc.last_contacted.unwrap_or(cc.created_at);
            let due_at = base
                .checked_add_signed(delay)
                .ok_or_else(|| Error::Config(format!("Due time for {} is out of range", cc.id)))?
                .max(earliest);
            let kind = if cc.phones.is_empty() { TaskKind::Email } else { TaskKind::Call };
            let verb = match kind {
                TaskKind::Call => "Call",
                TaskKind::Email => "Email",
            };

            tasks.push(ScheduledTask {
                id: uuid_utils::generate(),
                user_id: user_id.to_string(),
                call_center_id: cc.id.clone(),
                call_center_name: cc.name.clone(),
                title: format!("{} {}", verb, cc.name),
                kind,
                due_at,
                created_at: now,
            });
        }

        tasks.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.call_center_name.cmp(&b.call_center_name)));
        if tasks.len() > self.config.max_tasks {
            warnings.push(format!(
                "Limited to {} tasks; {} call centers not scheduled",
                self.config.max_tasks,
                tasks.len() - self.config.max_tasks
            ));
            tasks.truncate(self.config.max_tasks);
        }
        if tasks.is_empty() {
            warnings.push("No reachable call centers in an active status".to_string());
        }

        let mut batch = self.store.batch();
        batch.delete_where_eq(collections::SCHEDULED_TASKS, "userId", user_id);
        for task in &tasks {
            batch.create(collections::SCHEDULED_TASKS, &task.id, task)?;
        }
        batch.commit(&self.store).await?;

        for warning in &warnings {
            warn!(user = user_id, "{}", warning);
        }

        let horizon = Duration::try_hours(self.config.notify_within_hours)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut notifications = Vec::new();
        for task in tasks.iter().filter(|task| task.due_at <= horizon) {
            let message = format!("{} due at {} UTC", task.title, task.due_at.format("%Y-%m-%d %H:%M"));
            self.events.emit_lossy(CrmEvent::TaskDue {
                task_id: task.id.clone(),
                user_id: user_id.to_string(),
                call_center_id: task.call_center_id.clone(),
                message: message.clone(),
                due_at: task.due_at,
            });
            notifications.push(Notification {
                task_id: task.id.clone(),
                message,
                due_at: task.due_at,
            });
        }

        info!(
            user = user_id,
            tasks = tasks.len(),
            notifications = notifications.len(),
            "Test schedule generated"
        );
        self.events.emit_lossy(CrmEvent::ScheduleGenerated {
            user_id: user_id.to_string(),
            task_count: tasks.len(),
            timestamp: now,
        });

        Ok(ScheduleReport {
            task_count: tasks.len(),
            warnings,
            notifications,
            tasks,
        })
    }

    /// Tasks of a user ordered by due time
    pub async fn list_tasks(&self, user_id: &str) -> Result<Vec<ScheduledTask>> {
        let mut tasks: Vec<ScheduledTask> = self
            .store
            .list_where_eq(collections::SCHEDULED_TASKS, "userId", user_id)
            .await?;
        tasks.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccrm_common::models::NewCallCenter;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 10, 20, 0).unwrap()
    }

    async fn service(config: SchedulingConfig) -> SchedulingService {
        let store = DocumentStore::open_in_memory().await.unwrap();
        SchedulingService::new(store, EventBus::new(64), config)
    }

    async fn add(
        svc: &SchedulingService,
        name: &str,
        status: CallCenterStatus,
        phones: &[&str],
        emails: &[&str],
        last_contacted: Option<DateTime<Utc>>,
    ) -> CallCenter {
        let cc = NewCallCenter {
            name: name.to_string(),
            status,
            phones: phones.iter().map(|p| p.to_string()).collect(),
            emails: emails.iter().map(|e| e.to_string()).collect(),
            last_contacted,
            ..Default::default()
        }
        .into_call_center(uuid_utils::generate(), now() - Duration::days(30))
        .unwrap();
        svc.store.create(collections::CALL_CENTERS, &cc.id, &cc).await.unwrap();
        cc
    }

    #[tokio::test]
    async fn test_schedules_active_reachable_call_centers() {
        let svc = service(SchedulingConfig::default()).await;
        add(&svc, "Phone Co", CallCenterStatus::New, &["+212 600 000 000"], &[], None).await;
        add(&svc, "Mail Co", CallCenterStatus::Interested, &[], &["ops@mail.co"], None).await;
        add(&svc, "Closed Co", CallCenterStatus::Closed, &["+212 600 000 001"], &[], None).await;
        add(&svc, "Silent Co", CallCenterStatus::Contacted, &[], &[], None).await;

        let report = svc.generate_test_schedule("user-1", now()).await.unwrap();
        assert_eq!(report.task_count, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Silent Co"));

        let kinds: Vec<TaskKind> = report.tasks.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TaskKind::Call));
        assert!(kinds.contains(&TaskKind::Email));
    }

    #[tokio::test]
    async fn test_overdue_tasks_clamp_to_next_hour_and_notify() {
        let svc = service(SchedulingConfig::default()).await;
        add(&svc, "Overdue", CallCenterStatus::Callback, &["0600000000"], &[], None).await;
        let recent = now() - Duration::hours(1);
        add(&svc, "Recent", CallCenterStatus::Contacted, &["0611111111"], &[], Some(recent)).await;

        let mut rx = svc.events.subscribe();
        let report = svc.generate_test_schedule("user-1", now()).await.unwrap();

        let overdue = report.tasks.iter().find(|t| t.call_center_name == "Overdue").unwrap();
        assert_eq!(overdue.due_at, Utc.with_ymd_and_hms(2024, 9, 10, 11, 0, 0).unwrap());

        let recent_task = report.tasks.iter().find(|t| t.call_center_name == "Recent").unwrap();
        assert_eq!(recent_task.due_at, recent + Duration::days(3));

        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.notifications[0].task_id, overdue.id);
        assert!(matches!(rx.try_recv().unwrap(), CrmEvent::TaskDue { .. }));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_previous_tasks() {
        let svc = service(SchedulingConfig::default()).await;
        add(&svc, "A", CallCenterStatus::New, &["0600000000"], &[], None).await;

        svc.generate_test_schedule("user-1", now()).await.unwrap();
        svc.generate_test_schedule("user-2", now()).await.unwrap();
        svc.generate_test_schedule("user-1", now()).await.unwrap();

        assert_eq!(svc.list_tasks("user-1").await.unwrap().len(), 1);
        assert_eq!(svc.list_tasks("user-2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_max_tasks_truncates_with_warning() {
        let config = SchedulingConfig {
            max_tasks: 2,
            ..Default::default()
        };
        let svc = service(config).await;
        for name in ["A", "B", "C"] {
            add(&svc, name, CallCenterStatus::New, &["0600000000"], &[], None).await;
        }

        let report = svc.generate_test_schedule("user-1", now()).await.unwrap();
        assert_eq!(report.task_count, 2);
        assert!(report.warnings.iter().any(|w| w.starts_with("Limited to 2 tasks")));
    }

    #[tokio::test]
    async fn test_out_of_range_delay_is_an_error() {
        let config = SchedulingConfig {
            contacted_delay_days: i64::MAX / 1000,
            ..Default::default()
        };
        let svc = service(config).await;
        add(&svc, "Far", CallCenterStatus::Contacted, &["0600000000"], &[], None).await;

        let result = svc.generate_test_schedule("user-1", now()).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(svc.list_tasks("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delay_past_calendar_end_is_an_error() {
        let config = SchedulingConfig {
            new_delay_hours: 3_000_000_000,
            ..Default::default()
        };
        let svc = service(config).await;
        add(&svc, "Late", CallCenterStatus::New, &["0600000000"], &[], None).await;

        let result = svc.generate_test_schedule("user-1", now()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_blank_user_rejected() {
        let svc = service(SchedulingConfig::default()).await;
        assert!(matches!(
            svc.generate_test_schedule("  ", now()).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
