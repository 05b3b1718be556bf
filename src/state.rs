use anyhow::{anyhow, Context};
use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    notification::NotificationRelay,
    reminder::{ReminderRepository, ReminderService},
    workflow::{EventSender, ReminderWorkflow, WorkflowEvent, WorkflowRunRepository, WorkflowRuntime},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub reminder_service: ReminderService,
    pub relay: NotificationRelay,
    pub events: EventSender,
    pub runtime: WorkflowRuntime,
    pub runs: Arc<dyn WorkflowRunRepository>,
}

impl AppState {
    /// Wires services together. The returned receiver feeds `WorkflowRuntime::listen`.
    pub fn new(
        config: Arc<Config>,
        reminders: Arc<dyn ReminderRepository>,
        runs: Arc<dyn WorkflowRunRepository>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (events, events_rx) = EventSender::channel();
        let relay = NotificationRelay::new(config.notification_capacity);

        let workflow = ReminderWorkflow::new(
            reminders.clone(),
            runs.clone(),
            relay.clone(),
            config.display_offset,
        );
        let runtime = WorkflowRuntime::new(workflow, runs.clone());
        let reminder_service = ReminderService::new(reminders, events.clone());

        let state = Self {
            config,
            reminder_service,
            relay,
            events,
            runtime,
            runs,
        };
        (state, events_rx)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Offset used when rendering reminder times in notification messages.
    pub display_offset: FixedOffset,
    pub notification_capacity: usize,
    pub recovery_sweep_cron: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 3000,
            display_offset: FixedOffset::east_opt(330 * 60).expect("IST is a valid offset"),
            notification_capacity: 100,
            recovery_sweep_cron: "0 * * * * *".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let offset_minutes: i32 = parse_var("DISPLAY_UTC_OFFSET_MINUTES", 330)?;
        let display_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            anyhow!("DISPLAY_UTC_OFFSET_MINUTES out of range: {}", offset_minutes)
        })?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            display_offset,
            notification_capacity: parse_var("NOTIFICATION_CAPACITY", defaults.notification_capacity)?,
            recovery_sweep_cron: std::env::var("RECOVERY_SWEEP_CRON")
                .unwrap_or(defaults.recovery_sweep_cron),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
