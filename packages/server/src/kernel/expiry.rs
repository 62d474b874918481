//! In-process expiry timers.
//!
//! One sleeping tokio task per item. Timers are not persisted; on startup
//! `rearm_pending_expiries` rebuilds them from `available_till`, and the cron sweep
//! catches anything that slipped through.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::common::ItemId;
use crate::domains::items::actions::expire_item;
use crate::kernel::{BaseExpiryScheduler, BaseItemStore};

pub struct TokioExpiryScheduler {
    items: Arc<dyn BaseItemStore>,
}

impl TokioExpiryScheduler {
    pub fn new(items: Arc<dyn BaseItemStore>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl BaseExpiryScheduler for TokioExpiryScheduler {
    async fn schedule(&self, item_id: ItemId, fires_at: DateTime<Utc>) -> Result<()> {
        // Overdue deadlines fire immediately
        let delay = (fires_at - Utc::now()).to_std().unwrap_or_default();
        let items = self.items.clone();

        debug!(item_id = %item_id, delay_secs = delay.as_secs(), "Expiry scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = expire_item(items.as_ref(), item_id, Utc::now()).await {
                error!(item_id = %item_id, error = %e, "Scheduled expiry failed");
            }
        });

        Ok(())
    }
}
