use std::sync::Arc;

use timebeacon::{
    db::{create_pool, run_migrations},
    reminder::{MemoryReminderRepository, PgReminderRepository, ReminderRepository},
    routes::create_router,
    state::{AppState, Config},
    workflow::{
        start_recovery_sweep, MemoryWorkflowRunRepository, PgWorkflowRunRepository,
        WorkflowRunRepository,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,timebeacon=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Create repositories
    let (reminders, runs): (Arc<dyn ReminderRepository>, Arc<dyn WorkflowRunRepository>) =
        match &config.database_url {
            Some(database_url) => {
                tracing::info!("Connecting to database...");
                let db = create_pool(database_url, config.database_max_connections).await?;

                tracing::info!("Running migrations...");
                run_migrations(&db).await?;

                (
                    Arc::new(PgReminderRepository::new(db.clone())),
                    Arc::new(PgWorkflowRunRepository::new(db)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, reminders are kept in memory only");
                (
                    Arc::new(MemoryReminderRepository::new()),
                    Arc::new(MemoryWorkflowRunRepository::new()),
                )
            }
        };

    let (state, events_rx) = AppState::new(config.clone(), reminders, runs);

    // Start workflow runtime and resume interrupted runs
    state.runtime.listen(events_rx);
    let resumed = state.runtime.recover().await?;
    if !resumed.is_empty() {
        tracing::info!("Resumed {} reminder workflow run(s)", resumed.len());
    }

    let _recovery = start_recovery_sweep(state.runtime.clone(), &config.recovery_sweep_cron).await?;

    // Create router
    let app = create_router(state);

    // Start server
    let addr = config.addr();
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
