use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const REMINDER_CREATED: &str = "reminder/created";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderCreated {
    pub id: Uuid,
    pub remind_at: DateTime<Utc>,
}

/// Event envelope handed to the workflow runtime: `{"name": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum WorkflowEvent {
    #[serde(rename = "reminder/created")]
    ReminderCreated(ReminderCreated),
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::ReminderCreated(_) => REMINDER_CREATED,
        }
    }
}

/// Sending half of the runtime's event queue.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<WorkflowEvent>,
}

impl EventSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: WorkflowEvent) -> Result<()> {
        let name = event.name();
        self.tx
            .send(event)
            .map_err(|_| AppError::Workflow(format!("runtime stopped, dropped {}", name)))
    }
}
