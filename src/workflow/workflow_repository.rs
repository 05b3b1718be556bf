use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use super::workflow_models::{RunPhase, WorkflowRun};

/// Durable record of workflow runs; what lets a pending sleep survive a restart.
#[async_trait]
pub trait WorkflowRunRepository: Send + Sync {
    async fn insert(&self, run: &WorkflowRun) -> Result<()>;

    async fn update_phase(
        &self,
        id: Uuid,
        phase: RunPhase,
        wake_at: Option<DateTime<Utc>>,
        detail: Option<&str>,
    ) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkflowRun>>;

    /// Runs still in `SCHEDULED` or `WAITING`, oldest first.
    async fn find_unfinished(&self) -> Result<Vec<WorkflowRun>>;
}

#[derive(Clone)]
pub struct PgWorkflowRunRepository {
    pool: PgPool,
}

impl PgWorkflowRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRunRepository for PgWorkflowRunRepository {
    async fn insert(&self, run: &WorkflowRun) -> Result<()> {
        sqlx::query(
            "INSERT INTO workflow_runs (id, reminder_id, remind_at, phase, wake_at, detail, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(run.id)
        .bind(run.reminder_id)
        .bind(run.remind_at)
        .bind(run.phase)
        .bind(run.wake_at)
        .bind(run.detail.as_deref())
        .bind(run.created_at)
        .bind(run.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_phase(
        &self,
        id: Uuid,
        phase: RunPhase,
        wake_at: Option<DateTime<Utc>>,
        detail: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workflow_runs SET
                phase = $1,
                wake_at = COALESCE($2, wake_at),
                detail = COALESCE($3, detail),
                updated_at = NOW()
             WHERE id = $4",
        )
        .bind(phase)
        .bind(wake_at)
        .bind(detail)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkflowRun>> {
        let run = sqlx::query_as::<_, WorkflowRun>("SELECT * FROM workflow_runs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(run)
    }

    async fn find_unfinished(&self) -> Result<Vec<WorkflowRun>> {
        let runs = sqlx::query_as::<_, WorkflowRun>(
            "SELECT * FROM workflow_runs
             WHERE phase IN ('SCHEDULED', 'WAITING')
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(runs)
    }
}

#[derive(Clone, Default)]
pub struct MemoryWorkflowRunRepository {
    runs: Arc<DashMap<Uuid, WorkflowRun>>,
}

impl MemoryWorkflowRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<WorkflowRun> {
        self.runs.get(&id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl WorkflowRunRepository for MemoryWorkflowRunRepository {
    async fn insert(&self, run: &WorkflowRun) -> Result<()> {
        self.runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn update_phase(
        &self,
        id: Uuid,
        phase: RunPhase,
        wake_at: Option<DateTime<Utc>>,
        detail: Option<&str>,
    ) -> Result<()> {
        if let Some(mut entry) = self.runs.get_mut(&id) {
            let run = entry.value_mut();
            run.phase = phase;
            if wake_at.is_some() {
                run.wake_at = wake_at;
            }
            if let Some(detail) = detail {
                run.detail = Some(detail.to_string());
            }
            run.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkflowRun>> {
        Ok(self.get(id))
    }

    async fn find_unfinished(&self) -> Result<Vec<WorkflowRun>> {
        let mut runs: Vec<WorkflowRun> = self
            .runs
            .iter()
            .filter(|entry| !entry.value().phase.is_finished())
            .map(|entry| entry.value().clone())
            .collect();
        runs.sort_by_key(|run| run.created_at);
        Ok(runs)
    }
}
