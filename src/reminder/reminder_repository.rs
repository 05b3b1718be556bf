use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use super::reminder_models::{NewReminder, Reminder, ReminderPatch, ReminderStatus};

/// Persistence boundary for reminders.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn create(&self, reminder: NewReminder) -> Result<Reminder>;

    /// All reminders ordered by `remind_at` ascending.
    async fn find_all(&self) -> Result<Vec<Reminder>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>>;

    /// Returns `None` when no reminder with `id` exists.
    async fn update(&self, id: Uuid, patch: &ReminderPatch) -> Result<Option<Reminder>>;

    /// Returns the number of deleted rows.
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgReminderRepository {
    pool: PgPool,
}

impl PgReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    async fn create(&self, reminder: NewReminder) -> Result<Reminder> {
        let reminder = sqlx::query_as::<_, Reminder>(
            "INSERT INTO reminders (title, body, remind_at, status)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&reminder.title)
        .bind(reminder.body.as_deref())
        .bind(reminder.remind_at)
        .bind(ReminderStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(reminder)
    }

    async fn find_all(&self) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            "SELECT * FROM reminders ORDER BY remind_at ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>> {
        let reminder = sqlx::query_as::<_, Reminder>("SELECT * FROM reminders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reminder)
    }

    async fn update(&self, id: Uuid, patch: &ReminderPatch) -> Result<Option<Reminder>> {
        let reminder = sqlx::query_as::<_, Reminder>(
            "UPDATE reminders SET
                title = COALESCE($1, title),
                body = COALESCE($2, body),
                remind_at = COALESCE($3, remind_at),
                status = COALESCE($4, status),
                updated_at = NOW()
             WHERE id = $5
             RETURNING *",
        )
        .bind(patch.title.as_deref())
        .bind(patch.body.as_deref())
        .bind(patch.remind_at)
        .bind(patch.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reminder)
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Process-local store used when no `DATABASE_URL` is configured, and in tests.
#[derive(Clone, Default)]
pub struct MemoryReminderRepository {
    reminders: Arc<DashMap<Uuid, Reminder>>,
}

impl MemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderRepository for MemoryReminderRepository {
    async fn create(&self, reminder: NewReminder) -> Result<Reminder> {
        let now = Utc::now();
        let reminder = Reminder {
            id: Uuid::new_v4(),
            title: reminder.title,
            body: reminder.body,
            remind_at: reminder.remind_at,
            status: ReminderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.reminders.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn find_all(&self) -> Result<Vec<Reminder>> {
        let mut reminders: Vec<Reminder> =
            self.reminders.iter().map(|entry| entry.value().clone()).collect();
        reminders.sort_by(|a, b| {
            a.remind_at
                .cmp(&b.remind_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(reminders)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>> {
        Ok(self.reminders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: Uuid, patch: &ReminderPatch) -> Result<Option<Reminder>> {
        Ok(self.reminders.get_mut(&id).map(|mut entry| {
            patch.apply(entry.value_mut(), Utc::now());
            entry.value().clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        Ok(self.reminders.remove(&id).map_or(0, |_| 1))
    }
}
