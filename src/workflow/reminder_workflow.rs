use chrono::{DateTime, FixedOffset, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use crate::{
    error::{AppError, Result},
    notification::{Notification, NotificationRelay},
    reminder::{ReminderPatch, ReminderRepository, ReminderStatus},
};
use super::{
    workflow_models::{RunPhase, WorkflowOutcome, WorkflowRun},
    workflow_repository::WorkflowRunRepository,
};

/// Drives one reminder from `Scheduled` through `Waiting` to a terminal phase.
///
/// Failures are reported on the relay and recorded on the run as `ERRORED`.
/// Errored runs are never retried; re-sending `reminder/created` starts a new run.
#[derive(Clone)]
pub struct ReminderWorkflow {
    reminders: Arc<dyn ReminderRepository>,
    runs: Arc<dyn WorkflowRunRepository>,
    relay: NotificationRelay,
    display_offset: FixedOffset,
}

impl ReminderWorkflow {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        runs: Arc<dyn WorkflowRunRepository>,
        relay: NotificationRelay,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            reminders,
            runs,
            relay,
            display_offset,
        }
    }

    pub async fn execute(&self, run: WorkflowRun) -> WorkflowOutcome {
        let run_id = run.id;
        let reminder_id = run.reminder_id;

        match self.drive(run).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let detail = e.to_string();
                error!("Error processing reminder {}: {}", reminder_id, detail);

                self.relay.publish(Notification::error(reminder_id, &detail));
                if let Err(e) = self
                    .runs
                    .update_phase(run_id, RunPhase::Errored, None, Some(&detail))
                    .await
                {
                    error!("Could not record failure of run {}: {}", run_id, e);
                }

                WorkflowOutcome::Failed {
                    reminder_id,
                    error: detail,
                }
            }
        }
    }

    async fn drive(&self, run: WorkflowRun) -> Result<WorkflowOutcome> {
        let delay = match run.phase {
            RunPhase::Scheduled => self.announce(&run).await?,
            // Already announced before the restart; only the remainder is left.
            RunPhase::Waiting => run
                .wake_at
                .and_then(|wake_at| reminder_delay(wake_at, Utc::now())),
            finished => {
                warn!("Run {} is already {}, nothing to do", run.id, finished);
                return Ok(WorkflowOutcome::Skipped {
                    reminder_id: run.reminder_id,
                    reason: "run_finished".to_string(),
                });
            }
        };

        if let Some(delay) = delay {
            debug!("{} sleeping for {}s", run.sleep_key(), delay.as_secs());
            sleep_for(delay).await;
        }

        info!("Reminder {} is due! Marking as COMPLETED...", run.reminder_id);
        self.resolve(&run).await
    }

    /// Publishes the scheduled notification and persists the wake time.
    async fn announce(&self, run: &WorkflowRun) -> Result<Option<Duration>> {
        let now = Utc::now();
        let delay = reminder_delay(run.remind_at, now);

        info!(
            "Reminder {}: scheduled (UTC) {}, scheduled (local) {}, current (UTC) {}, delay {}s",
            run.reminder_id,
            run.remind_at.to_rfc3339(),
            format_local(run.remind_at, self.display_offset),
            now.to_rfc3339(),
            delay.map_or(0, |d| d.as_secs()),
        );

        self.relay.publish(Notification::scheduled(
            run.reminder_id,
            format!(
                "Reminder scheduled for {}",
                format_local(run.remind_at, self.display_offset)
            ),
        ));

        match delay {
            Some(delay) => {
                let wake_at = now
                    + chrono::Duration::from_std(delay)
                        .map_err(|e| AppError::Workflow(e.to_string()))?;
                self.runs
                    .update_phase(run.id, RunPhase::Waiting, Some(wake_at), None)
                    .await?;
            }
            None => warn!(
                "Reminder {} is in the past. Executing immediately.",
                run.reminder_id
            ),
        }

        Ok(delay)
    }

    async fn resolve(&self, run: &WorkflowRun) -> Result<WorkflowOutcome> {
        if self.reminders.find_by_id(run.reminder_id).await?.is_none() {
            return self.skip_deleted(run).await;
        }

        let completed = self
            .reminders
            .update(
                run.reminder_id,
                &ReminderPatch::status_only(ReminderStatus::Completed),
            )
            .await?;
        if completed.is_none() {
            // Deleted between the lookup and the update.
            return self.skip_deleted(run).await;
        }

        self.runs
            .update_phase(run.id, RunPhase::Completed, None, Some("completed"))
            .await?;
        self.relay.publish(Notification::completed(run.reminder_id));

        info!("Reminder {} updated successfully", run.reminder_id);
        Ok(WorkflowOutcome::Completed {
            reminder_id: run.reminder_id,
        })
    }

    async fn skip_deleted(&self, run: &WorkflowRun) -> Result<WorkflowOutcome> {
        info!(
            "Reminder {} not found (likely deleted). Skipping execution...",
            run.reminder_id
        );

        self.runs
            .update_phase(run.id, RunPhase::Skipped, None, Some("reminder_deleted"))
            .await?;
        self.relay.publish(Notification::deleted(run.reminder_id));

        Ok(WorkflowOutcome::reminder_deleted(run.reminder_id))
    }
}

/// Longest single timer; tokio clamps deadlines beyond roughly two years.
const MAX_SLEEP_CHUNK: Duration = Duration::from_secs(24 * 60 * 60);

async fn sleep_for(delay: Duration) {
    let mut remaining = delay;
    while !remaining.is_zero() {
        let step = remaining.min(MAX_SLEEP_CHUNK);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}

/// Time left until `target`, rounded up to whole seconds. `None` once due.
pub fn reminder_delay(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    let secs = (millis as u64).div_ceil(1000);
    Some(Duration::from_secs(secs))
}

pub fn format_local(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%d/%m/%Y, %-I:%M:%S %P")
        .to_string()
}
