//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Overdue expiry sweep: withdraws items whose per-item timer never fired
//!
//! # Architecture
//!
//! Per-item timers (`kernel::expiry`) do the normal work. The sweep is the backstop:
//!
//! ```text
//! Scheduler (every minute by default)
//!     │
//!     └─► find_pending_expiries()
//!             └─► For each overdue item → expire_item (idempotent)
//! ```

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::items::actions::expire_overdue_items;
use crate::kernel::BaseItemStore;

/// Start all scheduled tasks
pub async fn start_scheduler(
    items: Arc<dyn BaseItemStore>,
    sweep_schedule: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_items = items.clone();
    let sweep_job = Job::new_async(sweep_schedule, move |_uuid, _lock| {
        let items = sweep_items.clone();
        Box::pin(async move {
            if let Err(e) = run_expiry_sweep(items.as_ref()).await {
                tracing::error!("Expiry sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %sweep_schedule, "Scheduled tasks started (expiry sweep)");
    Ok(scheduler)
}

/// Run the overdue expiry sweep once
async fn run_expiry_sweep(items: &dyn BaseItemStore) -> Result<()> {
    tracing::debug!("Running expiry sweep");

    let expired = expire_overdue_items(items, Utc::now()).await?;

    if expired > 0 {
        tracing::info!("Expiry sweep complete: withdrew {} items", expired);
    }

    Ok(())
}
