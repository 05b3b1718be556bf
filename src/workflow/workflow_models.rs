use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::workflow_events::ReminderCreated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RunPhase {
    Scheduled,
    Waiting,
    Completed,
    Skipped,
    Errored,
}

impl RunPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Skipped | RunPhase::Errored)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Scheduled => write!(f, "SCHEDULED"),
            RunPhase::Waiting => write!(f, "WAITING"),
            RunPhase::Completed => write!(f, "COMPLETED"),
            RunPhase::Skipped => write!(f, "SKIPPED"),
            RunPhase::Errored => write!(f, "ERRORED"),
        }
    }
}

/// One persisted execution of the reminder workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: Uuid,
    pub reminder_id: Uuid,
    pub remind_at: DateTime<Utc>,
    pub phase: RunPhase,
    /// Set when the run starts sleeping.
    pub wake_at: Option<DateTime<Utc>>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn new(event: &ReminderCreated) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reminder_id: event.id,
            remind_at: event.remind_at,
            phase: RunPhase::Scheduled,
            wake_at: None,
            detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sleep_key(&self) -> String {
        sleep_key(self.reminder_id)
    }
}

/// At most one live run may hold the sleep key of a reminder.
pub fn sleep_key(reminder_id: Uuid) -> String {
    format!("wait-reminder-{}", reminder_id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Completed { reminder_id: Uuid },
    Skipped { reminder_id: Uuid, reason: String },
    Failed { reminder_id: Uuid, error: String },
}

impl WorkflowOutcome {
    pub fn reminder_deleted(reminder_id: Uuid) -> Self {
        WorkflowOutcome::Skipped {
            reminder_id,
            reason: "reminder_deleted".to_string(),
        }
    }
}
