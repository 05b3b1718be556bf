use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReminderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderStatus::Pending => write!(f, "PENDING"),
            ReminderStatus::Completed => write!(f, "COMPLETED"),
            ReminderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when persisting a new reminder. Status always starts as `PENDING`.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub body: Option<String>,
    pub remind_at: DateTime<Utc>,
}

/// Field-level partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub remind_at: Option<DateTime<Utc>>,
    pub status: Option<ReminderStatus>,
}

impl ReminderPatch {
    pub fn status_only(status: ReminderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.remind_at.is_none()
            && self.status.is_none()
    }

    pub fn apply(&self, reminder: &mut Reminder, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            reminder.title = title.clone();
        }
        if let Some(body) = &self.body {
            reminder.body = Some(body.clone());
        }
        if let Some(remind_at) = self.remind_at {
            reminder.remind_at = remind_at;
        }
        if let Some(status) = self.status {
            reminder.status = status;
        }
        reminder.updated_at = now;
    }
}
