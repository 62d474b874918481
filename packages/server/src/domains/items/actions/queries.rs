//! Read-side actions: proximity browse and owner-scoped histories
//!
//! None of these take locks; they read whatever the store has committed.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::common::{paginate, slice_page, AppError, AppResult, Page, UserId};
use crate::domains::identity::{Actor, Caller, RoleKind};
use crate::domains::items::data::{
    party_ids, CategoriesData, DonationsData, HistoryParams, ItemData, ListingParams,
    ListingsData, OrganizationItemsData, Parties,
};
use crate::domains::items::models::{Category, Item};
use crate::domains::items::validation::{validate_history_params, validate_listing_params};
use crate::kernel::{ListingFilter, ServerDeps};

/// Public summaries for every user the given items reference.
pub async fn load_parties(items: &[Item], deps: &ServerDeps) -> AppResult<Parties> {
    let mut ids: Vec<UserId> = items.iter().flat_map(party_ids).collect();
    ids.sort();
    ids.dedup();

    let parties = deps.identities.find_parties(&ids).await?;
    Ok(parties.into_iter().map(|p| (p.id, p)).collect())
}

async fn to_item_page(page: Page<Item>, deps: &ServerDeps) -> AppResult<Page<ItemData>> {
    let parties = load_parties(&page.items, deps).await?;
    Ok(page.map(|item| ItemData::new(&item, &parties)))
}

/// The stored account behind `caller`, which must still exist with the same role.
pub(crate) async fn load_caller(caller: Caller, deps: &ServerDeps) -> AppResult<Actor> {
    let missing = match caller.kind() {
        RoleKind::Samaritan => "Samaritan not found",
        RoleKind::Organization => "Organization not found",
    };

    deps.identities
        .find_actor(caller.id())
        .await?
        .filter(|actor| actor.kind() == caller.kind())
        .ok_or_else(|| AppError::not_found(missing))
}

/// Every category with its id, including the "All" filter.
pub fn list_categories() -> CategoriesData {
    CategoriesData {
        options: Category::filter_options(),
    }
}

/// Available items near the calling organization, nearest first.
#[instrument(skip(params, deps), fields(caller = ?caller))]
pub async fn browse_listings(
    caller: Caller,
    params: &ListingParams,
    deps: &ServerDeps,
) -> AppResult<ListingsData> {
    let Caller::Organization(organization_id) = caller else {
        return Err(AppError::forbidden("Only organizations can browse listings"));
    };

    let query = validate_listing_params(
        params,
        deps.settings.items_per_page,
        deps.settings.default_radius_km,
    )?;

    let organization = load_caller(caller, deps).await?;
    let origin = organization
        .as_organization()
        .map(|profile| profile.location)
        .ok_or_else(|| AppError::forbidden("Only organizations can browse listings"))?;

    let hits = deps
        .geo_index
        .within_radius(
            origin,
            query.radius_km,
            ListingFilter {
                category: query.category,
                as_of: Utc::now(),
            },
        )
        .await?;

    debug!(
        organization_id = %organization_id,
        radius_km = query.radius_km,
        matches = hits.len(),
        "Proximity search"
    );

    let page = paginate(hits, query.page)?;
    let items: Vec<Item> = page.items.iter().map(|hit| hit.item.clone()).collect();
    let parties = load_parties(&items, deps).await?;
    let results = page.map(|hit| ItemData::new(&hit.item, &parties).with_distance(hit.distance_km));

    Ok(ListingsData {
        radius_km: query.radius_km,
        results,
    })
}

/// Items the calling samaritan has posted, split by whether they are still active.
#[instrument(skip(params, deps), fields(caller = ?caller))]
pub async fn samaritan_donations(
    caller: Caller,
    params: &HistoryParams,
    deps: &ServerDeps,
) -> AppResult<DonationsData> {
    let Caller::Samaritan(samaritan_id) = caller else {
        return Err(AppError::forbidden("Only samaritans can view their donations"));
    };

    let query = validate_history_params(params, deps.settings.history_items_per_page)?;
    load_caller(caller, deps).await?;

    let posted = deps
        .items
        .find_posted_by(samaritan_id, query.category)
        .await?;
    let (active, inactive): (Vec<Item>, Vec<Item>) =
        posted.into_iter().partition(|item| item.state.is_active());

    let (active, active_pages) = slice_page(active, query.page);
    let (inactive, inactive_pages) = slice_page(inactive, query.page);
    active_pages.ensure_contains(query.page.page)?;
    inactive_pages.ensure_contains(query.page.page)?;

    Ok(DonationsData {
        page: query.page.page,
        active_items: to_item_page(active, deps).await?,
        inactive_items: to_item_page(inactive, deps).await?,
    })
}

/// Items the calling organization currently holds and has collected.
#[instrument(skip(params, deps), fields(caller = ?caller))]
pub async fn organization_items(
    caller: Caller,
    params: &HistoryParams,
    deps: &ServerDeps,
) -> AppResult<OrganizationItemsData> {
    let Caller::Organization(organization_id) = caller else {
        return Err(AppError::forbidden("Only organizations can view their items"));
    };

    let query = validate_history_params(params, deps.settings.history_items_per_page)?;
    load_caller(caller, deps).await?;

    let held = deps
        .items
        .find_held_by(organization_id, query.category)
        .await?;
    let collected = deps
        .items
        .find_collected_by(organization_id, query.category)
        .await?;

    let (reserved, reserved_pages) = slice_page(held, query.page);
    let (picked_up, picked_up_pages) = slice_page(collected, query.page);
    reserved_pages.ensure_contains(query.page.page)?;
    picked_up_pages.ensure_contains(query.page.page)?;

    Ok(OrganizationItemsData {
        page: query.page.page,
        reserved_items: to_item_page(reserved, deps).await?,
        picked_up_items: to_item_page(picked_up, deps).await?,
    })
}
