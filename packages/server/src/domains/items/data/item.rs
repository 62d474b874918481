use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::common::{round_km, GeoPoint, ItemId, Options, Page, UserId};
use crate::domains::identity::PartySummary;
use crate::domains::items::models::{Category, Item, Measure, PickupWindow};

/// Users referenced by a batch of items, keyed by id.
pub type Parties = HashMap<UserId, PartySummary>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryData {
    pub id: i32,
    pub name: &'static str,
}

impl From<Category> for CategoryData {
    fn from(category: Category) -> Self {
        Self {
            id: category.id(),
            name: category.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureData {
    pub value: f64,
    pub unit: Option<String>,
}

impl From<&Measure> for MeasureData {
    fn from(measure: &Measure) -> Self {
        Self {
            value: measure.value,
            unit: measure.unit.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupWindowData {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl From<PickupWindow> for PickupWindowData {
    fn from(window: PickupWindow) -> Self {
        let hhmm = |t: NaiveTime| t.format("%H:%M").to_string();
        Self {
            start: window.start.map(hhmm),
            end: window.end.map(hhmm),
        }
    }
}

/// Public view of a user attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyData {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PartyData {
    fn lookup(id: UserId, parties: &Parties) -> Self {
        match parties.get(&id) {
            Some(party) => Self {
                id,
                username: Some(party.username.clone()),
                name: party.name.clone(),
            },
            None => Self {
                id,
                username: None,
                name: None,
            },
        }
    }
}

/// Item as returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ItemData {
    pub id: ItemId,
    pub category: CategoryData,
    pub description: String,
    pub pickup_location: GeoPoint,
    /// Present only in proximity results. Kilometers, 2 decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<MeasureData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<MeasureData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_before: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_window: Option<PickupWindowData>,
    pub available_till: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub posted_by: PartyData,
    pub is_active: bool,
    pub is_reserved: bool,
    pub is_picked_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<PartyData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_by: Option<PartyData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemData {
    pub fn new(item: &Item, parties: &Parties) -> Self {
        let state = item.state;
        Self {
            id: item.id,
            category: item.category.into(),
            description: item.description.clone(),
            pickup_location: item.pickup_location,
            distance_km: None,
            weight: item.weight.as_ref().map(MeasureData::from),
            volume: item.volume.as_ref().map(MeasureData::from),
            best_before: item.best_before,
            pickup_window: (!item.pickup_window.is_empty())
                .then(|| PickupWindowData::from(item.pickup_window)),
            available_till: item.available_till,
            image: item.image.clone(),
            posted_by: PartyData::lookup(item.posted_by, parties),
            is_active: state.is_active(),
            is_reserved: state.is_reserved(),
            is_picked_up: state.is_picked_up(),
            reserved_by: state.reserved_by().map(|id| PartyData::lookup(id, parties)),
            picked_up_by: state.picked_up_by().map(|id| PartyData::lookup(id, parties)),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }

    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(round_km(distance_km));
        self
    }
}

/// Every user id an item points at.
pub fn party_ids(item: &Item) -> impl Iterator<Item = UserId> {
    [
        Some(item.posted_by),
        item.state.reserved_by(),
        item.state.picked_up_by(),
    ]
    .into_iter()
    .flatten()
}

/// Response of a single-item mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub message: &'static str,
    pub item: ItemData,
}

/// Browse results.
#[derive(Debug, Clone, Serialize)]
pub struct ListingsData {
    pub radius_km: f64,
    #[serde(flatten)]
    pub results: Page<ItemData>,
}

/// A samaritan's posted items.
#[derive(Debug, Clone, Serialize)]
pub struct DonationsData {
    pub page: usize,
    pub active_items: Page<ItemData>,
    pub inactive_items: Page<ItemData>,
}

/// An organization's reserved and collected items.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationItemsData {
    pub page: usize,
    pub reserved_items: Page<ItemData>,
    pub picked_up_items: Page<ItemData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesData {
    pub options: Options,
}
