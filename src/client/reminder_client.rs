use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::reminder::{CreateReminderRequest, DeleteReminderResponse, Reminder, UpdateReminderRequest};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to {action} reminder ({status}): {message}")]
    Status {
        action: &'static str,
        status: StatusCode,
        message: String,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed client for the `/api/reminder` endpoints.
#[derive(Clone)]
pub struct ReminderClient {
    http: Client,
    base_url: String,
}

impl ReminderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/api/reminder", self.base_url)
    }

    fn item_url(&self, id: Uuid) -> String {
        format!("{}/api/reminder/{}", self.base_url, id)
    }

    pub async fn create(&self, input: &CreateReminderRequest) -> Result<Reminder, ClientError> {
        let response = self.http.post(self.collection_url()).json(input).send().await?;
        Ok(check(response, "create").await?.json().await?)
    }

    pub async fn list(&self) -> Result<Vec<Reminder>, ClientError> {
        let response = self.http.get(self.collection_url()).send().await?;
        Ok(check(response, "fetch").await?.json().await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: &UpdateReminderRequest,
    ) -> Result<Reminder, ClientError> {
        let response = self.http.put(self.item_url(id)).json(input).send().await?;
        Ok(check(response, "update").await?.json().await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteReminderResponse, ClientError> {
        let response = self.http.delete(self.item_url(id)).send().await?;
        Ok(check(response, "delete").await?.json().await?)
    }
}

async fn check(response: Response, action: &'static str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    tracing::warn!("Failed to {} reminder: {} {}", action, status, message);
    Err(ClientError::Status {
        action,
        status,
        message,
    })
}
