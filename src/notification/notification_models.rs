use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Relay channel every reminder notification is published on.
pub const REMINDERS_CHANNEL: &str = "reminders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Scheduled,
    Completed,
    Error,
    Skipped,
}

impl NotificationKind {
    /// Event name used on the relay channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationKind::Scheduled => "reminder-scheduled",
            NotificationKind::Completed => "reminder-completed",
            NotificationKind::Error => "reminder-error",
            NotificationKind::Skipped => "reminder-skipped",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Scheduled => write!(f, "scheduled"),
            NotificationKind::Completed => write!(f, "completed"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub reminder_id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Notification {
    fn new(reminder_id: Uuid, kind: NotificationKind, message: String) -> Self {
        Self {
            reminder_id,
            message,
            timestamp: Utc::now(),
            kind,
            reason: None,
        }
    }

    pub fn scheduled(reminder_id: Uuid, message: String) -> Self {
        Self::new(reminder_id, NotificationKind::Scheduled, message)
    }

    pub fn completed(reminder_id: Uuid) -> Self {
        Self::new(
            reminder_id,
            NotificationKind::Completed,
            "Reminder completed!".to_string(),
        )
    }

    pub fn deleted(reminder_id: Uuid) -> Self {
        Self {
            reason: Some("DELETED".to_string()),
            ..Self::new(
                reminder_id,
                NotificationKind::Skipped,
                "Reminder was deleted before execution".to_string(),
            )
        }
    }

    pub fn error(reminder_id: Uuid, detail: &str) -> Self {
        Self::new(
            reminder_id,
            NotificationKind::Error,
            format!("Error processing reminder: {}", detail),
        )
    }
}
