use crate::{
    notification::{self, Notification, NotificationKind},
    reminder::{self, CreateReminderRequest, DeleteReminderResponse, Reminder, ReminderStatus, UpdateReminderRequest},
    state::AppState,
    workflow::{
        self,
        workflow_events::ReminderCreated,
        workflow_handlers::{IngestEventRequest, IngestEventResponse},
        RunPhase, WorkflowRun,
    },
};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        reminder::reminder_handlers::get_reminders,
        reminder::reminder_handlers::create_reminder,
        reminder::reminder_handlers::update_reminder,
        reminder::reminder_handlers::delete_reminder,
        notification::notification_handlers::notification_stream,
        workflow::workflow_handlers::ingest_event,
        workflow::workflow_handlers::list_unfinished_runs,
    ),
    components(
        schemas(
            Reminder,
            ReminderStatus,
            CreateReminderRequest,
            UpdateReminderRequest,
            DeleteReminderResponse,
            Notification,
            NotificationKind,
            ReminderCreated,
            IngestEventRequest,
            IngestEventResponse,
            WorkflowRun,
            RunPhase,
        )
    ),
    tags(
        (name = "reminders", description = "Reminder management endpoints"),
        (name = "notifications", description = "Live reminder notifications"),
        (name = "workflow", description = "Reminder workflow runtime")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reminder_routes = Router::new()
        .route(
            "/",
            get(reminder::get_reminders).post(reminder::create_reminder),
        )
        .route(
            "/:id",
            put(reminder::update_reminder).delete(reminder::delete_reminder),
        );

    let notification_routes =
        Router::new().route("/stream", get(notification::notification_stream));

    let workflow_routes = Router::new().route("/runs", get(workflow::list_unfinished_runs));

    let api_routes = Router::new()
        .nest("/reminder", reminder_routes)
        .nest("/notifications", notification_routes)
        .nest("/workflow", workflow_routes)
        .route("/events", post(workflow::ingest_event));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
