//! Test fixtures for creating test data.

use chrono::{DateTime, Duration, Utc};
use samaritan_core::common::{GeoPoint, ItemId, UserId};
use samaritan_core::domains::identity::{
    AddressInput, Caller, OrganizationSignupInput, SamaritanSignupInput,
};
use samaritan_core::domains::items::{create_item, CreateItemInput, ItemData};
use samaritan_core::domains::items::models::{Category, Item, ItemState, PickupWindow};
use samaritan_core::kernel::ServerDeps;
use serde_json::json;

/// Downtown Winnipeg
pub fn origin() -> GeoPoint {
    GeoPoint::new(49.8951, -97.1384)
}

pub fn organization_signup(username: &str, location: GeoPoint) -> OrganizationSignupInput {
    OrganizationSignupInput {
        username: Some(username.to_string()),
        email: Some(format!("{}@example.org", username)),
        name: Some(format!("{} Food Bank", username)),
        location: Some(json!({
            "latitude": location.latitude,
            "longitude": location.longitude,
        })),
        address: AddressInput {
            address_line1: Some("1 Main St".to_string()),
            address_line2: None,
            city: Some("Winnipeg".to_string()),
            province: Some("MB".to_string()),
            postal_code: Some("r3c1a1".to_string()),
        },
    }
}

pub fn samaritan_signup(username: &str) -> SamaritanSignupInput {
    SamaritanSignupInput {
        username: Some(username.to_string()),
        email: Some(format!("{}@example.com", username)),
        address: AddressInput {
            city: Some("Winnipeg".to_string()),
            province: Some("MB".to_string()),
            ..Default::default()
        },
    }
}

/// Minimal valid donation picked up at `location`.
pub fn item_input(description: &str, location: GeoPoint) -> CreateItemInput {
    CreateItemInput {
        category: Some(json!(Category::Food.id())),
        description: Some(description.to_string()),
        pickup_location: Some(json!({
            "latitude": location.latitude,
            "longitude": location.longitude,
        })),
        ..Default::default()
    }
}

/// Donate an item through the create action.
pub async fn donate(
    deps: &ServerDeps,
    samaritan: UserId,
    description: &str,
    location: GeoPoint,
) -> ItemData {
    create_item(
        Caller::Samaritan(samaritan),
        item_input(description, location),
        deps,
    )
    .await
    .expect("Failed to donate item")
}

/// An item built directly, for seeding stores with exact timestamps.
pub fn stored_item(
    posted_by: UserId,
    location: GeoPoint,
    state: ItemState,
    available_till: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Item {
    Item {
        id: ItemId::new(),
        category: Category::Food,
        description: "Seeded item".to_string(),
        weight: None,
        volume: None,
        best_before: None,
        pickup_location: location,
        pickup_window: PickupWindow::default(),
        available_till,
        image: None,
        posted_by,
        state,
        created_at,
        updated_at: created_at,
    }
}

/// A deadline comfortably in the future.
pub fn later() -> DateTime<Utc> {
    Utc::now() + Duration::days(7)
}
