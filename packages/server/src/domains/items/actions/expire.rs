//! Expiry actions - withdraw items whose `available_till` has passed
//!
//! Called by the per-item timers, the periodic sweep, and the startup re-arm.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::common::{AppError, AppResult, ItemId};
use crate::domains::items::machines::{decide, Transition};
use crate::domains::items::models::Item;
use crate::kernel::{BaseExpiryScheduler, BaseItemStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// The item was withdrawn.
    Expired,
    /// Already withdrawn, already picked up, or gone.
    NoChange,
}

/// Withdraw one item. Idempotent.
#[instrument(skip(items))]
pub async fn expire_item(
    items: &dyn BaseItemStore,
    item_id: ItemId,
    now: DateTime<Utc>,
) -> AppResult<ExpiryOutcome> {
    let result = items
        .update_locked(item_id, &|item: &Item| decide(item, &Transition::Expire, now))
        .await;

    match result {
        Ok(update) if update.changed => {
            info!(item_id = %item_id, "Item expired");
            Ok(ExpiryOutcome::Expired)
        }
        Ok(_) => {
            debug!(item_id = %item_id, "Item already settled, nothing to expire");
            Ok(ExpiryOutcome::NoChange)
        }
        Err(AppError::NotFound(_)) => {
            debug!(item_id = %item_id, "Item no longer exists, nothing to expire");
            Ok(ExpiryOutcome::NoChange)
        }
        Err(e) => Err(e),
    }
}

/// Expire every item whose deadline is at or before `now`.
///
/// Catches items whose timer was lost (e.g. the process restarted between
/// re-arm and firing). Returns how many items were withdrawn.
pub async fn expire_overdue_items(
    items: &dyn BaseItemStore,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let overdue: Vec<ItemId> = items
        .find_pending_expiries()
        .await?
        .into_iter()
        .filter(|(_, till)| *till <= now)
        .map(|(id, _)| id)
        .collect();

    let mut expired = 0;
    for item_id in overdue {
        match expire_item(items, item_id, now).await {
            Ok(ExpiryOutcome::Expired) => expired += 1,
            Ok(ExpiryOutcome::NoChange) => {}
            Err(e) => warn!(item_id = %item_id, error = %e, "Failed to expire item"),
        }
    }

    if expired > 0 {
        info!(expired, "Expired overdue items");
    }

    Ok(expired)
}

/// Schedule a timer for every item still waiting on its deadline.
///
/// Run once at startup; timers do not survive a restart but `available_till` does.
pub async fn rearm_pending_expiries(
    items: &dyn BaseItemStore,
    scheduler: &dyn BaseExpiryScheduler,
) -> AppResult<usize> {
    let pending = items.find_pending_expiries().await?;
    let count = pending.len();

    for (item_id, fires_at) in pending {
        scheduler.schedule(item_id, fires_at).await?;
    }

    info!(count, "Re-armed pending item expiries");
    Ok(count)
}
