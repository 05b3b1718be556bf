use chrono::{FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::reminder::CreateReminderRequest;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("Please select a date and time")]
    MissingDateTime,

    #[error("Invalid date and time: {0}")]
    InvalidDateTime(String),
}

/// Creation form as entered: `remind_at` is a `datetime-local` value such as
/// `2025-12-10T21:51`, read as wall-clock time in the display offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderForm {
    pub title: String,
    pub body: String,
    pub remind_at: String,
}

impl ReminderForm {
    pub fn to_request(&self, offset: FixedOffset) -> Result<CreateReminderRequest, FormError> {
        let raw = self.remind_at.trim();
        if raw.is_empty() {
            return Err(FormError::MissingDateTime);
        }

        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| FormError::InvalidDateTime(raw.to_string()))?;
        let local = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| FormError::InvalidDateTime(raw.to_string()))?;

        Ok(CreateReminderRequest {
            title: Some(self.title.clone()),
            body: Some(self.body.clone()),
            note: None,
            remind_at: Some(
                local
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        })
    }

    /// Clears the form after a successful submission.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
