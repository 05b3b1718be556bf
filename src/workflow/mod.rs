pub mod recovery_service;
pub mod reminder_workflow;
pub mod workflow_events;
pub mod workflow_handlers;
pub mod workflow_models;
pub mod workflow_repository;
pub mod workflow_runtime;

pub use recovery_service::start_recovery_sweep;
pub use reminder_workflow::ReminderWorkflow;
pub use workflow_events::{EventSender, ReminderCreated, WorkflowEvent};
pub use workflow_handlers::{ingest_event, list_unfinished_runs};
pub use workflow_models::{RunPhase, WorkflowOutcome, WorkflowRun};
pub use workflow_repository::{
    MemoryWorkflowRunRepository, PgWorkflowRunRepository, WorkflowRunRepository,
};
pub use workflow_runtime::WorkflowRuntime;
