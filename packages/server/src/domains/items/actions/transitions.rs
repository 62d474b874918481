//! Reserve, unreserve, and pickup actions
//!
//! Each action runs one guarded transition under the item's lock. Guard failures are
//! returned as-is and never retried.

use chrono::Utc;
use tracing::{debug, info, instrument};

use super::queries::load_parties;
use crate::common::{AppError, AppResult, ItemId};
use crate::domains::identity::Caller;
use crate::domains::items::data::ItemData;
use crate::domains::items::machines::{decide, Transition};
use crate::domains::items::models::Item;
use crate::kernel::ServerDeps;

/// Run `transition` against the stored item and return the updated record.
async fn apply(item_id: ItemId, transition: Transition, deps: &ServerDeps) -> AppResult<Item> {
    let now = Utc::now();
    let update = deps
        .items
        .update_locked(item_id, &|item: &Item| decide(item, &transition, now))
        .await?;

    debug!(
        item_id = %item_id,
        transition = transition.name(),
        changed = update.changed,
        state = update.item.state.as_str(),
        "Transition applied"
    );

    Ok(update.item)
}

async fn respond(item: Item, deps: &ServerDeps) -> AppResult<ItemData> {
    let parties = load_parties(std::slice::from_ref(&item), deps).await?;
    Ok(ItemData::new(&item, &parties))
}

/// Reserve an available item for the calling organization.
#[instrument(skip(deps), fields(caller = ?caller))]
pub async fn reserve_item(caller: Caller, item_id: ItemId, deps: &ServerDeps) -> AppResult<ItemData> {
    let Caller::Organization(organization_id) = caller else {
        return Err(AppError::forbidden("Only organizations can reserve items"));
    };

    let item = apply(item_id, Transition::Reserve(caller), deps).await?;
    info!(item_id = %item_id, organization_id = %organization_id, "Item reserved");

    respond(item, deps).await
}

/// Release a reservation held by the calling organization.
#[instrument(skip(deps), fields(caller = ?caller))]
pub async fn unreserve_item(
    caller: Caller,
    item_id: ItemId,
    deps: &ServerDeps,
) -> AppResult<ItemData> {
    let Caller::Organization(organization_id) = caller else {
        return Err(AppError::forbidden("Only organizations can unreserve items"));
    };

    let item = apply(item_id, Transition::Unreserve(caller), deps).await?;
    info!(item_id = %item_id, organization_id = %organization_id, "Item unreserved");

    respond(item, deps).await
}

/// Mark a reserved item as collected.
///
/// Either side of the handoff may confirm it: the reserving organization or the donor.
/// The pickup is always credited to the reserving organization.
#[instrument(skip(deps), fields(caller = ?caller))]
pub async fn pickup_item(caller: Caller, item_id: ItemId, deps: &ServerDeps) -> AppResult<ItemData> {
    let item = apply(item_id, Transition::PickUp(caller), deps).await?;
    info!(
        item_id = %item_id,
        confirmed_by = %caller.id(),
        picked_up_by = ?item.state.picked_up_by(),
        "Item picked up"
    );

    respond(item, deps).await
}
