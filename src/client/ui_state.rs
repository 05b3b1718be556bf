use serde::{Deserialize, Serialize};

use crate::reminder::{Reminder, ReminderStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFilter {
    All,
    #[default]
    Pending,
    Completed,
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        match self {
            ReminderFilter::All => true,
            ReminderFilter::Pending => reminder.status == ReminderStatus::Pending,
            ReminderFilter::Completed => reminder.status == ReminderStatus::Completed,
        }
    }
}

/// View state of the reminder list: active filter and whether the create
/// modal is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub filter: ReminderFilter,
    pub modal_open: bool,
}

impl UiState {
    pub fn set_filter(&mut self, filter: ReminderFilter) {
        self.filter = filter;
    }

    pub fn open_modal(&mut self) {
        self.modal_open = true;
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
    }

    /// Reminders shown under the current filter, keeping list order.
    pub fn visible<'a>(&self, reminders: &'a [Reminder]) -> Vec<&'a Reminder> {
        reminders
            .iter()
            .filter(|reminder| self.filter.matches(reminder))
            .collect()
    }

    pub fn empty_message(&self) -> &'static str {
        match self.filter {
            ReminderFilter::All => "No reminders for this view. Create one to get started!",
            ReminderFilter::Pending => "No pending reminders. Create one to get started!",
            ReminderFilter::Completed => "No completed reminders. Create one to get started!",
        }
    }
}
