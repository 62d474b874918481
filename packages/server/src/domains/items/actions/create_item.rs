//! Donate item action - validates, persists, and arms expiry for a new item

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use super::queries::{load_caller, load_parties};
use crate::common::{AppError, AppResult, ItemId};
use crate::domains::identity::Caller;
use crate::domains::items::data::{CreateItemInput, ItemData};
use crate::domains::items::models::{Item, ItemState};
use crate::domains::items::validation::validate_new_item;
use crate::kernel::ServerDeps;

/// Create a new donation for the calling samaritan.
///
/// This action:
/// 1. Validates the request and checks the samaritan still exists (nothing is stored on failure)
/// 2. Persists the item as available
/// 3. Attaches the image, if one was supplied
/// 4. Schedules expiry at `available_till`
///
/// If step 3 or 4 fails the item and any stored image are deleted again and the error
/// is returned.
#[instrument(skip(input, deps), fields(caller = ?caller))]
pub async fn create_item(
    caller: Caller,
    input: CreateItemInput,
    deps: &ServerDeps,
) -> AppResult<ItemData> {
    let Caller::Samaritan(samaritan_id) = caller else {
        return Err(AppError::forbidden("Only samaritans can donate items"));
    };

    let now = Utc::now();
    let new_item = validate_new_item(&input, now)?;
    load_caller(caller, deps).await?;

    let item = Item {
        id: ItemId::new(),
        category: new_item.category,
        description: new_item.description,
        weight: new_item.weight,
        volume: new_item.volume,
        best_before: new_item.best_before,
        pickup_location: new_item.pickup_location,
        pickup_window: new_item.pickup_window,
        available_till: Some(
            new_item
                .available_till
                .unwrap_or(now + deps.settings.item_lifetime),
        ),
        image: None,
        posted_by: samaritan_id,
        state: ItemState::Available,
        created_at: now,
        updated_at: now,
    };

    deps.items.insert(&item).await?;

    let mut image = None;
    let item = match finish_creation(item.clone(), &input, &mut image, deps).await {
        Ok(item) => item,
        Err(e) => {
            warn!(item_id = %item.id, error = %e, "Rolling back item creation");
            if let Some(reference) = image {
                if let Err(cleanup) = deps.images.remove(&reference).await {
                    error!(item_id = %item.id, error = %cleanup, "Failed to remove item image");
                }
            }
            if let Err(rollback) = deps.items.delete(item.id).await {
                error!(item_id = %item.id, error = %rollback, "Failed to roll back item");
            }
            return Err(e);
        }
    };

    info!(
        item_id = %item.id,
        samaritan_id = %samaritan_id,
        category = %item.category,
        "Item donated"
    );

    let parties = load_parties(std::slice::from_ref(&item), deps).await?;
    Ok(ItemData::new(&item, &parties))
}

/// Post-insert side effects. Any error here triggers a rollback.
///
/// `image` records the stored reference so the rollback can remove it.
async fn finish_creation(
    mut item: Item,
    input: &CreateItemInput,
    image: &mut Option<String>,
    deps: &ServerDeps,
) -> AppResult<Item> {
    if let Some(upload) = &input.image {
        let reference = image.insert(deps.images.store(item.id, upload).await?);
        item = deps.items.set_image(item.id, reference.as_str()).await?;
    }

    if let Some(fires_at) = item.available_till {
        deps.expiry.schedule(item.id, fires_at).await?;
    }

    Ok(item)
}
