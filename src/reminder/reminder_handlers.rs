use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use super::{
    reminder_dto::{CreateReminderRequest, DeleteReminderResponse, UpdateReminderRequest},
    reminder_models::Reminder,
};

/// An id that cannot be parsed cannot exist either.
fn reminder_id(path: std::result::Result<Path<Uuid>, PathRejection>) -> Result<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Reminder not found".to_string()))
}

/// List all reminders ordered by target time
#[utoipa::path(
    get,
    path = "/api/reminder",
    responses(
        (status = 200, description = "Reminders sorted by remindAt ascending", body = Vec<Reminder>)
    ),
    tag = "reminders"
)]
pub async fn get_reminders(State(state): State<AppState>) -> Result<Json<Vec<Reminder>>> {
    let reminders = state.reminder_service.list_reminders().await?;
    Ok(Json(reminders))
}

/// Create a reminder and schedule its workflow
#[utoipa::path(
    post,
    path = "/api/reminder",
    request_body = CreateReminderRequest,
    responses(
        (status = 200, description = "Reminder created", body = Reminder),
        (status = 400, description = "title and remindAt are required")
    ),
    tag = "reminders"
)]
pub async fn create_reminder(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateReminderRequest>, JsonRejection>,
) -> Result<Json<Reminder>> {
    let Json(payload) = payload?;
    let reminder = state.reminder_service.create_reminder(payload).await?;
    Ok(Json(reminder))
}

/// Update any subset of a reminder's fields
#[utoipa::path(
    put,
    path = "/api/reminder/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    request_body = UpdateReminderRequest,
    responses(
        (status = 200, description = "Reminder updated", body = Reminder),
        (status = 400, description = "No fields to update"),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders"
)]
pub async fn update_reminder(
    State(state): State<AppState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<UpdateReminderRequest>, JsonRejection>,
) -> Result<Json<Reminder>> {
    let reminder_id = reminder_id(path)?;
    let Json(payload) = payload?;

    let reminder = state
        .reminder_service
        .update_reminder(reminder_id, payload)
        .await?;

    Ok(Json(reminder))
}

/// Delete a reminder
#[utoipa::path(
    delete,
    path = "/api/reminder/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Reminder deleted", body = DeleteReminderResponse),
        (status = 404, description = "Reminder not found")
    ),
    tag = "reminders"
)]
pub async fn delete_reminder(
    State(state): State<AppState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteReminderResponse>> {
    let reminder_id = reminder_id(path)?;
    state.reminder_service.delete_reminder(reminder_id).await?;

    Ok(Json(DeleteReminderResponse {
        message: "Reminder deleted successfully".to_string(),
    }))
}
