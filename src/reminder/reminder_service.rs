use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    workflow::{EventSender, ReminderCreated, WorkflowEvent},
};
use super::{
    reminder_dto::{CreateReminderRequest, UpdateReminderRequest},
    reminder_models::Reminder,
    reminder_repository::ReminderRepository,
};

/// Service layer for reminder-related business logic.
#[derive(Clone)]
pub struct ReminderService {
    repo: Arc<dyn ReminderRepository>,
    events: EventSender,
}

impl ReminderService {
    pub fn new(repo: Arc<dyn ReminderRepository>, events: EventSender) -> Self {
        Self { repo, events }
    }

    /// Persists a `PENDING` reminder, then hands `reminder/created` to the runtime.
    pub async fn create_reminder(&self, payload: CreateReminderRequest) -> Result<Reminder> {
        let new_reminder = payload.into_new_reminder()?;
        let reminder = self.repo.create(new_reminder).await?;

        info!(
            "Reminder created: id={} remindAt={}",
            reminder.id,
            reminder.remind_at.to_rfc3339()
        );

        self.events
            .send(WorkflowEvent::ReminderCreated(ReminderCreated {
                id: reminder.id,
                remind_at: reminder.remind_at,
            }))?;

        Ok(reminder)
    }

    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        self.repo.find_all().await
    }

    /// Status may be set freely, including out of `COMPLETED` or `CANCELLED`.
    pub async fn update_reminder(
        &self,
        reminder_id: Uuid,
        payload: UpdateReminderRequest,
    ) -> Result<Reminder> {
        let patch = payload.into_patch()?;
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }

        let reminder = self
            .repo
            .update(reminder_id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Reminder not found".into()))?;

        info!("Reminder updated successfully: {}", reminder.id);
        Ok(reminder)
    }

    pub async fn delete_reminder(&self, reminder_id: Uuid) -> Result<()> {
        if self.repo.delete(reminder_id).await? == 0 {
            return Err(AppError::NotFound("Reminder not found".into()));
        }

        info!("Reminder deleted successfully: {}", reminder_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{MemoryReminderRepository, ReminderStatus};
    use tokio::sync::mpsc;

    fn service() -> (ReminderService, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (events, rx) = EventSender::channel();
        let service = ReminderService::new(Arc::new(MemoryReminderRepository::new()), events);
        (service, rx)
    }

    fn create_request(title: &str, remind_at: &str) -> CreateReminderRequest {
        CreateReminderRequest {
            title: Some(title.to_string()),
            remind_at: Some(remind_at.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_emits_one_event() {
        let (service, mut rx) = service();

        let reminder = service
            .create_reminder(create_request("Call mom", "2025-01-01T10:00:00Z"))
            .await
            .unwrap();

        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkflowEvent::ReminderCreated(ReminderCreated {
                id: reminder.id,
                remind_at: reminder.remind_at,
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_create_emits_nothing() {
        let (service, mut rx) = service();

        let result = service
            .create_reminder(CreateReminderRequest {
                title: Some("Call mom".into()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(rx.try_recv().is_err());
        assert!(service.list_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_leaves_record_untouched() {
        let (service, _rx) = service();
        let reminder = service
            .create_reminder(create_request("Call mom", "2025-01-01T10:00:00Z"))
            .await
            .unwrap();

        let result = service
            .update_reminder(reminder.id, UpdateReminderRequest::default())
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(service.list_reminders().await.unwrap(), vec![reminder]);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (service, _rx) = service();
        let update = UpdateReminderRequest {
            status: Some(ReminderStatus::Completed),
            ..Default::default()
        };

        assert!(matches!(
            service.update_reminder(Uuid::new_v4(), update).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_reminder(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_completed_reminder_can_be_reopened() {
        let (service, _rx) = service();
        let reminder = service
            .create_reminder(create_request("Call mom", "2025-01-01T10:00:00Z"))
            .await
            .unwrap();

        for status in [ReminderStatus::Completed, ReminderStatus::Pending] {
            let updated = service
                .update_reminder(
                    reminder.id,
                    UpdateReminderRequest {
                        status: Some(status),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }
}
