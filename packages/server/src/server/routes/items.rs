//! Item lifecycle and owner-scoped history routes.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};

use crate::common::{AppError, AppResult, ItemId};
use crate::domains::items::{
    create_item, organization_items, pickup_item, reserve_item, samaritan_donations,
    unreserve_item, CreateItemInput, DonationsData, HistoryParams, ItemResponse,
    OrganizationItemsData,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Unparseable ids name no item.
fn parse_item_id(raw: &str) -> AppResult<ItemId> {
    raw.parse()
        .map_err(|_| AppError::not_found("Item not found"))
}

/// POST /samaritan/donate
pub async fn donate_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<ItemResponse>)> {
    let item = create_item(user.caller(), input, &state.deps).await?;
    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            message: "Item donated successfully",
            item,
        }),
    ))
}

/// POST /items/:id/reserve
pub async fn reserve_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = reserve_item(user.caller(), parse_item_id(&id)?, &state.deps).await?;
    Ok(Json(ItemResponse {
        message: "Item reserved successfully",
        item,
    }))
}

/// POST /items/:id/unreserve
pub async fn unreserve_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = unreserve_item(user.caller(), parse_item_id(&id)?, &state.deps).await?;
    Ok(Json(ItemResponse {
        message: "Item unreserved successfully",
        item,
    }))
}

/// POST /items/:id/pickup
pub async fn pickup_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = pickup_item(user.caller(), parse_item_id(&id)?, &state.deps).await?;
    Ok(Json(ItemResponse {
        message: "Item picked up successfully",
        item,
    }))
}

/// GET /samaritan/items
pub async fn samaritan_items_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DonationsData>> {
    Ok(Json(
        samaritan_donations(user.caller(), &params, &state.deps).await?,
    ))
}

/// GET /organization/items
pub async fn organization_items_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<OrganizationItemsData>> {
    Ok(Json(
        organization_items(user.caller(), &params, &state.deps).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_id() {
        let id = ItemId::new();
        assert_eq!(parse_item_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_item_id("not-a-uuid"),
            Err(AppError::NotFound(_))
        ));
    }
}
