use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::workflow_runtime::WorkflowRuntime;

/// Periodically resumes persisted runs whose task is gone.
///
/// The returned scheduler must be kept alive for the sweep to keep running.
pub async fn start_recovery_sweep(
    runtime: WorkflowRuntime,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let runtime = runtime.clone();

        Box::pin(async move {
            match runtime.recover().await {
                Ok(resumed) if !resumed.is_empty() => {
                    info!("Recovery sweep resumed {} workflow runs", resumed.len())
                }
                Ok(_) => {}
                Err(e) => error!("Recovery sweep failed: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Recovery sweep started ({})", schedule);
    Ok(scheduler)
}
