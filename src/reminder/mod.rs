pub mod reminder_dto;
pub mod reminder_handlers;
pub mod reminder_models;
pub mod reminder_repository;
pub mod reminder_service;

pub use reminder_dto::{CreateReminderRequest, DeleteReminderResponse, UpdateReminderRequest};
pub use reminder_handlers::{create_reminder, delete_reminder, get_reminders, update_reminder};
pub use reminder_models::{NewReminder, Reminder, ReminderPatch, ReminderStatus};
pub use reminder_repository::{MemoryReminderRepository, PgReminderRepository, ReminderRepository};
pub use reminder_service::ReminderService;
