use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, Result};
use super::reminder_models::{NewReminder, ReminderPatch, ReminderStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    #[validate(length(max = 500))]
    pub title: Option<String>,
    pub body: Option<String>,
    /// Older clients send the body as `note`; `body` wins when both are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// ISO-8601 timestamp, stored as UTC.
    pub remind_at: Option<String>,
}

impl CreateReminderRequest {
    pub fn into_new_reminder(self) -> Result<NewReminder> {
        self.validate()?;

        let title = self.title.filter(|t| !t.trim().is_empty());
        let remind_at = self.remind_at.filter(|r| !r.trim().is_empty());
        let (Some(title), Some(remind_at)) = (title, remind_at) else {
            return Err(AppError::Validation(
                "title and remindAt are required".to_string(),
            ));
        };

        Ok(NewReminder {
            title,
            body: self.body.or(self.note),
            remind_at: parse_timestamp(&remind_at)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderRequest {
    #[validate(length(max = 500))]
    pub title: Option<String>,
    pub body: Option<String>,
    pub note: Option<String>,
    pub remind_at: Option<String>,
    pub status: Option<ReminderStatus>,
}

impl UpdateReminderRequest {
    /// Empty strings count as absent, so `{"title": ""}` is an empty update.
    pub fn into_patch(self) -> Result<ReminderPatch> {
        self.validate()?;

        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let remind_at = match non_empty(self.remind_at) {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        Ok(ReminderPatch {
            title: non_empty(self.title),
            body: non_empty(self.body).or_else(|| non_empty(self.note)),
            remind_at,
            status: self.status,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteReminderResponse {
    pub message: String,
}

/// Accepts RFC 3339 timestamps; an offset-less timestamp is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            AppError::Validation(format!("remindAt is not a valid ISO-8601 timestamp: {}", raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_requires_title_and_remind_at() {
        let missing_time = CreateReminderRequest {
            title: Some("Call mom".into()),
            ..Default::default()
        };
        let blank_title = CreateReminderRequest {
            title: Some("   ".into()),
            remind_at: Some("2025-01-01T10:00:00Z".into()),
            ..Default::default()
        };

        for request in [missing_time, blank_title] {
            match request.into_new_reminder() {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "title and remindAt are required")
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_create_accepts_note_alias_and_offsets() {
        let request: CreateReminderRequest = serde_json::from_str(
            r#"{"title":"Call mom","note":"sunday","remindAt":"2025-01-01T15:30:00+05:30"}"#,
        )
        .unwrap();

        let new = request.into_new_reminder().unwrap();
        assert_eq!(new.body.as_deref(), Some("sunday"));
        assert_eq!(new.remind_at, Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_create_with_body_and_note_prefers_body() {
        let request: CreateReminderRequest = serde_json::from_str(
            r#"{"title":"Call mom","body":"from body","note":"from note","remindAt":"2025-01-01T10:00:00Z"}"#,
        )
        .unwrap();

        let new = request.into_new_reminder().unwrap();
        assert_eq!(new.body.as_deref(), Some("from body"));
    }

    #[test]
    fn test_create_rejects_long_title() {
        let request = CreateReminderRequest {
            title: Some("x".repeat(501)),
            remind_at: Some("2025-01-01T10:00:00Z".into()),
            ..Default::default()
        };
        assert!(matches!(request.into_new_reminder(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_ignores_empty_strings() {
        let request = UpdateReminderRequest {
            title: Some(String::new()),
            body: Some(String::new()),
            ..Default::default()
        };
        assert!(request.into_patch().unwrap().is_empty());
    }

    #[test]
    fn test_update_prefers_body_over_note() {
        let request: UpdateReminderRequest =
            serde_json::from_str(r#"{"body":"from body","note":"from note"}"#).unwrap();
        assert_eq!(request.into_patch().unwrap().body.as_deref(), Some("from body"));

        let request: UpdateReminderRequest =
            serde_json::from_str(r#"{"note":"from note"}"#).unwrap();
        assert_eq!(request.into_patch().unwrap().body.as_deref(), Some("from note"));
    }

    #[test]
    fn test_parse_timestamp_without_offset_is_utc() {
        assert_eq!(
            parse_timestamp("2025-01-01T10:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
        );
        assert!(parse_timestamp("tomorrow").is_err());
    }
}
