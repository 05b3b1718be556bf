use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use super::{workflow_events::WorkflowEvent, workflow_models::WorkflowRun};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestEventRequest {
    /// Event name, e.g. `reminder/created`.
    pub name: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestEventResponse {
    pub accepted: String,
}

/// Send an event to the workflow runtime
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = IngestEventRequest,
    responses(
        (status = 202, description = "Event accepted", body = IngestEventResponse),
        (status = 400, description = "Unknown event or malformed data")
    ),
    tag = "workflow"
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IngestEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestEventResponse>)> {
    let Json(payload) = payload?;

    let envelope = serde_json::json!({ "name": payload.name, "data": payload.data });
    let event: WorkflowEvent = serde_json::from_value(envelope).map_err(|e| {
        AppError::BadRequest(format!("Unsupported event {}: {}", payload.name, e))
    })?;

    let name = event.name().to_string();
    state.events.send(event)?;

    Ok((StatusCode::ACCEPTED, Json(IngestEventResponse { accepted: name })))
}

/// List workflow runs that have not reached a terminal phase
#[utoipa::path(
    get,
    path = "/api/workflow/runs",
    responses(
        (status = 200, description = "Unfinished workflow runs", body = Vec<WorkflowRun>)
    ),
    tag = "workflow"
)]
pub async fn list_unfinished_runs(State(state): State<AppState>) -> Result<Json<Vec<WorkflowRun>>> {
    let runs = state.runs.find_unfinished().await?;
    Ok(Json(runs))
}
