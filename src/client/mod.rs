pub mod notification_center;
pub mod reminder_client;
pub mod reminder_form;
pub mod ui_state;

pub use notification_center::{NotificationCenter, Sound, SoundCue, Toast, DISPLAY_WINDOW};
pub use reminder_client::{ClientError, ReminderClient};
pub use reminder_form::{FormError, ReminderForm};
pub use ui_state::{ReminderFilter, UiState};
