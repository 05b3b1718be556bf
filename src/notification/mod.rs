pub mod notification_handlers;
pub mod notification_models;
pub mod notification_relay;

pub use notification_handlers::notification_stream;
pub use notification_models::{Notification, NotificationKind, REMINDERS_CHANNEL};
pub use notification_relay::NotificationRelay;
