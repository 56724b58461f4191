//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One repeated job runs the reminder sweep every `SWEEP_INTERVAL_SECONDS`.
//!
//! ```text
//! Scheduler (every interval)
//!     │
//!     └─► SweepRunner::tick()
//!             ├─► previous sweep still running → skip tick
//!             └─► spawn run_sweep(now) → join, log panic
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::reminders::{run_sweep, SweepReport};
use crate::kernel::ServerDeps;

/// Runs sweeps one at a time. A tick that arrives while a sweep is still in
/// progress is dropped.
#[derive(Clone)]
pub struct SweepRunner {
    deps: ServerDeps,
    running: Arc<Mutex<()>>,
}

impl SweepRunner {
    pub fn new(deps: ServerDeps) -> Self {
        Self {
            deps,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Run one sweep as of `now`. Returns `None` when the tick was skipped or
    /// the sweep task panicked.
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        let Ok(_running) = self.running.clone().try_lock_owned() else {
            tracing::warn!("Previous reminder sweep still running, skipping this tick");
            return None;
        };

        let deps = self.deps.clone();
        let handle = tokio::spawn(async move { run_sweep(&deps, now).await });
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Reminder sweep task failed");
                None
            }
        }
    }
}

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let interval = deps.sweep.interval;
    let runner = SweepRunner::new(deps);

    let sweep_job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            runner.tick(Utc::now()).await;
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(
        interval_secs = interval.as_secs(),
        "Scheduled tasks started (reminder sweep)"
    );
    Ok(scheduler)
}
