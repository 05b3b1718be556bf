use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use super::{
    reminder_workflow::ReminderWorkflow,
    workflow_events::WorkflowEvent,
    workflow_models::{WorkflowOutcome, WorkflowRun},
    workflow_repository::WorkflowRunRepository,
};

/// In-process workflow runtime: one task per run, keyed by sleep key.
#[derive(Clone)]
pub struct WorkflowRuntime {
    workflow: ReminderWorkflow,
    runs: Arc<dyn WorkflowRunRepository>,
    live: Arc<DashMap<String, Uuid>>,
}

/// Releases a sleep key when its run task ends, including by panic.
struct LiveKey {
    live: Arc<DashMap<String, Uuid>>,
    key: String,
}

impl Drop for LiveKey {
    fn drop(&mut self) {
        self.live.remove(&self.key);
    }
}

impl WorkflowRuntime {
    pub fn new(workflow: ReminderWorkflow, runs: Arc<dyn WorkflowRunRepository>) -> Self {
        Self {
            workflow,
            runs,
            live: Arc::new(DashMap::new()),
        }
    }

    /// Consumes events until every `EventSender` is dropped.
    pub fn listen(&self, mut rx: mpsc::UnboundedReceiver<WorkflowEvent>) -> JoinHandle<()> {
        let runtime = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = runtime.handle(event).await {
                    error!("Failed to start workflow run: {}", e);
                }
            }
            info!("Workflow event queue closed");
        })
    }

    /// Starts a run for `event`, unless its reminder already has a live run.
    pub async fn handle(&self, event: WorkflowEvent) -> Result<Option<JoinHandle<WorkflowOutcome>>> {
        match event {
            WorkflowEvent::ReminderCreated(created) => {
                let run = WorkflowRun::new(&created);
                let key = run.sleep_key();

                if !self.claim(&key, run.id) {
                    warn!("{} is already live, ignoring duplicate reminder/created", key);
                    return Ok(None);
                }

                if let Err(e) = self.runs.insert(&run).await {
                    self.live.remove(&key);
                    return Err(e);
                }

                Ok(Some(self.spawn(run)))
            }
        }
    }

    /// Resumes persisted runs that have no live task.
    pub async fn recover(&self) -> Result<Vec<JoinHandle<WorkflowOutcome>>> {
        let runs = self.runs.find_unfinished().await?;
        let mut handles = Vec::new();

        for run in runs {
            let key = run.sleep_key();
            if !self.claim(&key, run.id) {
                continue;
            }

            // The snapshot may predate a run that finished and released its key.
            let run = match self.runs.find_by_id(run.id).await {
                Ok(Some(current)) if !current.phase.is_finished() => current,
                Ok(_) => {
                    self.live.remove(&key);
                    continue;
                }
                Err(e) => {
                    self.live.remove(&key);
                    error!("Could not reload run {}: {}", run.id, e);
                    continue;
                }
            };

            info!(
                "Resuming run {} for reminder {} from {}",
                run.id, run.reminder_id, run.phase
            );
            handles.push(self.spawn(run));
        }

        Ok(handles)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, reminder_id: Uuid) -> bool {
        self.live
            .contains_key(&super::workflow_models::sleep_key(reminder_id))
    }

    fn claim(&self, key: &str, run_id: Uuid) -> bool {
        match self.live.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(run_id);
                true
            }
        }
    }

    fn spawn(&self, run: WorkflowRun) -> JoinHandle<WorkflowOutcome> {
        let workflow = self.workflow.clone();
        let guard = LiveKey {
            live: self.live.clone(),
            key: run.sleep_key(),
        };

        tokio::spawn(async move {
            let _guard = guard;
            let outcome = workflow.execute(run).await;
            info!("Workflow run finished: {:?}", outcome);
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        notification::{NotificationKind, NotificationRelay},
        reminder::{MemoryReminderRepository, NewReminder, ReminderRepository, ReminderStatus},
        workflow::{
            workflow_events::{EventSender, ReminderCreated},
            MemoryWorkflowRunRepository, RunPhase,
        },
    };
    use chrono::{Duration, FixedOffset, Utc};

    struct Harness {
        reminders: Arc<MemoryReminderRepository>,
        runs: Arc<MemoryWorkflowRunRepository>,
        relay: NotificationRelay,
        runtime: WorkflowRuntime,
    }

    fn harness() -> Harness {
        let reminders = Arc::new(MemoryReminderRepository::new());
        let runs = Arc::new(MemoryWorkflowRunRepository::new());
        let relay = NotificationRelay::new(16);
        let workflow = ReminderWorkflow::new(
            reminders.clone(),
            runs.clone(),
            relay.clone(),
            FixedOffset::east_opt(0).unwrap(),
        );
        let runtime = WorkflowRuntime::new(workflow, runs.clone());
        Harness {
            reminders,
            runs,
            relay,
            runtime,
        }
    }

    async fn created_event(h: &Harness, offset: Duration) -> ReminderCreated {
        let reminder = h
            .reminders
            .create(NewReminder {
                title: "Stand up".to_string(),
                body: None,
                remind_at: Utc::now() + offset,
            })
            .await
            .unwrap();
        ReminderCreated {
            id: reminder.id,
            remind_at: reminder.remind_at,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_event_does_not_double_schedule() {
        let h = harness();
        let mut rx = h.relay.subscribe();
        let created = created_event(&h, Duration::minutes(1)).await;

        let first = h
            .runtime
            .handle(WorkflowEvent::ReminderCreated(created.clone()))
            .await
            .unwrap();
        let second = h
            .runtime
            .handle(WorkflowEvent::ReminderCreated(created.clone()))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(h.runtime.is_live(created.id));

        first.unwrap().await.unwrap();
        assert!(!h.runtime.is_live(created.id));

        let mut kinds = Vec::new();
        while let Ok(n) = rx.try_recv() {
            kinds.push(n.kind);
        }
        assert_eq!(kinds, vec![NotificationKind::Scheduled, NotificationKind::Completed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_resumes_waiting_runs() {
        let h = harness();
        let created = created_event(&h, Duration::seconds(90)).await;

        // A run persisted by a previous process that was waiting when it stopped.
        let run = WorkflowRun::new(&created);
        h.runs.insert(&run).await.unwrap();
        h.runs
            .update_phase(run.id, RunPhase::Waiting, Some(created.remind_at), None)
            .await
            .unwrap();

        let handles = h.runtime.recover().await.unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(h.runtime.live_count(), 1);

        // A second sweep while the run is live leaves it alone.
        assert!(h.runtime.recover().await.unwrap().is_empty());

        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                WorkflowOutcome::Completed { .. }
            ));
        }

        let reminder = h.reminders.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reminder.status, ReminderStatus::Completed);
        assert!(h.runs.find_unfinished().await.unwrap().is_empty());
        assert_eq!(h.runtime.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_consumes_sent_events() {
        let h = harness();
        let mut rx = h.relay.subscribe();
        let (sender, events) = EventSender::channel();
        let listener = h.runtime.listen(events);

        let created = created_event(&h, Duration::seconds(-5)).await;
        sender
            .send(WorkflowEvent::ReminderCreated(created.clone()))
            .unwrap();

        let scheduled = rx.recv().await.unwrap();
        assert_eq!(scheduled.reminder_id, created.id);
        assert_eq!(scheduled.kind, NotificationKind::Scheduled);
        let completed = rx.recv().await.unwrap();
        assert_eq!(completed.kind, NotificationKind::Completed);

        drop(sender);
        listener.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_restarts_scheduled_run_from_announcement() {
        let h = harness();
        let mut rx = h.relay.subscribe();
        let created = created_event(&h, Duration::seconds(20)).await;

        // Persisted before the previous process got to announce it.
        let run = WorkflowRun::new(&created);
        h.runs.insert(&run).await.unwrap();

        let handles = h.runtime.recover().await.unwrap();
        assert_eq!(handles.len(), 1);
        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                WorkflowOutcome::Completed { .. }
            ));
        }

        let scheduled = rx.try_recv().unwrap();
        assert_eq!(scheduled.kind, NotificationKind::Scheduled);
        assert_eq!(scheduled.reminder_id, created.id);
        assert_eq!(rx.try_recv().unwrap().kind, NotificationKind::Completed);
        assert!(rx.try_recv().is_err());
        assert_eq!(h.runs.get(run.id).unwrap().phase, RunPhase::Completed);
    }

    /// Hands out its unfinished-run snapshot only after a delay.
    struct SlowSweepRuns {
        inner: MemoryWorkflowRunRepository,
        delay: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl WorkflowRunRepository for SlowSweepRuns {
        async fn insert(&self, run: &WorkflowRun) -> Result<()> {
            self.inner.insert(run).await
        }

        async fn update_phase(
            &self,
            id: Uuid,
            phase: RunPhase,
            wake_at: Option<chrono::DateTime<Utc>>,
            detail: Option<&str>,
        ) -> Result<()> {
            self.inner.update_phase(id, phase, wake_at, detail).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkflowRun>> {
            self.inner.find_by_id(id).await
        }

        async fn find_unfinished(&self) -> Result<Vec<WorkflowRun>> {
            let runs = self.inner.find_unfinished().await?;
            tokio::time::sleep(self.delay).await;
            Ok(runs)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_skips_run_that_finished_after_snapshot() {
        let reminders = Arc::new(MemoryReminderRepository::new());
        let runs = Arc::new(SlowSweepRuns {
            inner: MemoryWorkflowRunRepository::new(),
            delay: std::time::Duration::from_secs(2),
        });
        let relay = NotificationRelay::new(16);
        let mut rx = relay.subscribe();
        let workflow = ReminderWorkflow::new(
            reminders.clone(),
            runs.clone(),
            relay.clone(),
            FixedOffset::east_opt(0).unwrap(),
        );
        let runtime = WorkflowRuntime::new(workflow, runs.clone());

        let reminder = reminders
            .create(NewReminder {
                title: "Stand up".to_string(),
                body: None,
                remind_at: Utc::now() + Duration::seconds(1),
            })
            .await
            .unwrap();
        let created = ReminderCreated {
            id: reminder.id,
            remind_at: reminder.remind_at,
        };

        let first = runtime
            .handle(WorkflowEvent::ReminderCreated(created))
            .await
            .unwrap()
            .unwrap();
        let sweep = {
            let runtime = runtime.clone();
            tokio::spawn(async move { runtime.recover().await })
        };

        assert!(matches!(first.await.unwrap(), WorkflowOutcome::Completed { .. }));
        let resumed = sweep.await.unwrap().unwrap();
        assert!(resumed.is_empty());
        assert_eq!(runtime.live_count(), 0);

        let mut kinds = Vec::new();
        while let Ok(n) = rx.try_recv() {
            kinds.push(n.kind);
        }
        assert_eq!(kinds, vec![NotificationKind::Scheduled, NotificationKind::Completed]);
    }
}
