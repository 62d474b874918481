use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::category::Category;
use crate::common::{AppError, AppResult, GeoPoint, ItemId, UserId};

/// Magnitude + unit pair (weight or volume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    pub unit: Option<String>,
}

/// Time-of-day pickup window. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupWindow {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl PickupWindow {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Where an item is in its lifecycle.
///
/// `Withdrawn` is the only inactive state and is terminal. A completed pickup is always
/// credited to the reserving organization, so `Completed` carries a single id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Available,
    Reserved { by: UserId },
    Completed { by: UserId },
    Withdrawn { reserved_by: Option<UserId> },
}

impl ItemState {
    pub fn is_active(&self) -> bool {
        !matches!(self, ItemState::Withdrawn { .. })
    }

    pub fn is_reserved(&self) -> bool {
        match self {
            ItemState::Available => false,
            ItemState::Reserved { .. } | ItemState::Completed { .. } => true,
            ItemState::Withdrawn { reserved_by } => reserved_by.is_some(),
        }
    }

    pub fn is_picked_up(&self) -> bool {
        matches!(self, ItemState::Completed { .. })
    }

    pub fn reserved_by(&self) -> Option<UserId> {
        match self {
            ItemState::Available => None,
            ItemState::Reserved { by } | ItemState::Completed { by } => Some(*by),
            ItemState::Withdrawn { reserved_by } => *reserved_by,
        }
    }

    pub fn picked_up_by(&self) -> Option<UserId> {
        match self {
            ItemState::Completed { by } => Some(*by),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Available => "available",
            ItemState::Reserved { .. } => "reserved",
            ItemState::Completed { .. } => "completed",
            ItemState::Withdrawn { .. } => "withdrawn",
        }
    }

    /// Rebuild the state from its persisted columns.
    pub fn from_parts(
        state: &str,
        reserved_by: Option<UserId>,
        picked_up_by: Option<UserId>,
    ) -> anyhow::Result<Self> {
        match (state, reserved_by, picked_up_by) {
            ("available", None, None) => Ok(ItemState::Available),
            ("reserved", Some(by), None) => Ok(ItemState::Reserved { by }),
            ("completed", Some(reserved), Some(picked)) if reserved == picked => {
                Ok(ItemState::Completed { by: picked })
            }
            ("withdrawn", reserved_by, None) => Ok(ItemState::Withdrawn { reserved_by }),
            _ => Err(anyhow!(
                "inconsistent item state: state={} reserved_by={:?} picked_up_by={:?}",
                state,
                reserved_by,
                picked_up_by
            )),
        }
    }
}

/// Donated item.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub category: Category,
    pub description: String,
    pub weight: Option<Measure>,
    pub volume: Option<Measure>,
    pub best_before: Option<NaiveDate>,
    pub pickup_location: GeoPoint,
    pub pickup_window: PickupWindow,
    pub available_till: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub posted_by: UserId,
    pub state: ItemState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the deadline has passed at `now`. Items without a deadline never lapse.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.available_till.is_some_and(|till| till <= now)
    }

    /// Visible in the organization browse view at `as_of`.
    pub fn is_listable(&self, as_of: DateTime<Utc>) -> bool {
        self.state == ItemState::Available && !self.is_past_deadline(as_of)
    }

    /// Still waiting on its expiry timer.
    pub fn awaits_expiry(&self) -> bool {
        self.state.is_active() && !self.state.is_picked_up() && self.available_till.is_some()
    }

    /// Held by `organization` and not yet collected.
    pub fn is_held_by(&self, organization: UserId) -> bool {
        !self.state.is_picked_up() && self.state.reserved_by() == Some(organization)
    }

    /// Collected by `organization`.
    pub fn is_collected_by(&self, organization: UserId) -> bool {
        self.state.picked_up_by() == Some(organization)
    }
}

// =============================================================================
// SQL persistence
// =============================================================================

#[derive(sqlx::FromRow, Debug, Clone)]
struct ItemRow {
    id: ItemId,
    category: i32,
    description: String,
    weight: Option<f64>,
    weight_unit: Option<String>,
    volume: Option<f64>,
    volume_unit: Option<String>,
    best_before: Option<NaiveDate>,
    latitude: f64,
    longitude: f64,
    pickup_window_start: Option<NaiveTime>,
    pickup_window_end: Option<NaiveTime>,
    available_till: Option<DateTime<Utc>>,
    image: Option<String>,
    posted_by: UserId,
    state: String,
    reserved_by: Option<UserId>,
    picked_up_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct ItemDistanceRow {
    #[sqlx(flatten)]
    item: ItemRow,
    distance_km: f64,
}

impl TryFrom<ItemRow> for Item {
    type Error = anyhow::Error;

    fn try_from(row: ItemRow) -> anyhow::Result<Self> {
        let category = Category::from_id(row.category)
            .with_context(|| format!("item {} has unknown category {}", row.id, row.category))?;
        let state = ItemState::from_parts(&row.state, row.reserved_by, row.picked_up_by)
            .with_context(|| format!("item {} failed to load", row.id))?;

        Ok(Item {
            id: row.id,
            category,
            description: row.description,
            weight: row.weight.map(|value| Measure {
                value,
                unit: row.weight_unit,
            }),
            volume: row.volume.map(|value| Measure {
                value,
                unit: row.volume_unit,
            }),
            best_before: row.best_before,
            pickup_location: GeoPoint::new(row.latitude, row.longitude),
            pickup_window: PickupWindow {
                start: row.pickup_window_start,
                end: row.pickup_window_end,
            },
            available_till: row.available_till,
            image: row.image,
            posted_by: row.posted_by,
            state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> AppResult<Vec<Item>> {
    rows.into_iter()
        .map(|row| Item::try_from(row).map_err(AppError::from))
        .collect()
}

impl Item {
    /// Find item by ID
    pub async fn find_by_id(id: ItemId, pool: &PgPool) -> AppResult<Option<Self>> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Item::try_from).transpose().map_err(Into::into)
    }

    /// Insert new item
    pub async fn insert(&self, pool: &PgPool) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO items (
                id, category, description,
                weight, weight_unit, volume, volume_unit,
                best_before, latitude, longitude,
                pickup_window_start, pickup_window_end,
                available_till, image, posted_by,
                state, reserved_by, picked_up_by,
                created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
        )
        .bind(self.id)
        .bind(self.category.id())
        .bind(&self.description)
        .bind(self.weight.as_ref().map(|m| m.value))
        .bind(self.weight.as_ref().and_then(|m| m.unit.clone()))
        .bind(self.volume.as_ref().map(|m| m.value))
        .bind(self.volume.as_ref().and_then(|m| m.unit.clone()))
        .bind(self.best_before)
        .bind(self.pickup_location.latitude)
        .bind(self.pickup_location.longitude)
        .bind(self.pickup_window.start)
        .bind(self.pickup_window.end)
        .bind(self.available_till)
        .bind(&self.image)
        .bind(self.posted_by)
        .bind(self.state.as_str())
        .bind(self.state.reserved_by())
        .bind(self.state.picked_up_by())
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Hard delete. Only used to roll back a creation whose side effects failed.
    pub async fn delete(id: ItemId, pool: &PgPool) -> AppResult<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Attach an image reference
    pub async fn set_image(id: ItemId, image: &str, pool: &PgPool) -> AppResult<Self> {
        let row = sqlx::query_as::<_, ItemRow>(
            "UPDATE items SET image = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(image)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))?;

        Item::try_from(row).map_err(Into::into)
    }

    /// Locked read-modify-write.
    ///
    /// The row stays locked (`FOR UPDATE`) from the read until commit, so `decide` sees
    /// the state the write will replace. Returning `Ok(None)` from `decide` leaves the
    /// row untouched; returning an error rolls the transaction back.
    pub async fn update_locked(
        id: ItemId,
        decide: &(dyn Fn(&Item) -> AppResult<Option<ItemState>> + Send + Sync),
        pool: &PgPool,
    ) -> AppResult<(Item, bool)> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Item not found"))?;
        let item = Item::try_from(row)?;

        let Some(next) = decide(&item)? else {
            tx.commit().await?;
            return Ok((item, false));
        };

        let row = sqlx::query_as::<_, ItemRow>(
            "UPDATE items
             SET state = $2, reserved_by = $3, picked_up_by = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(next.as_str())
        .bind(next.reserved_by())
        .bind(next.picked_up_by())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((Item::try_from(row)?, true))
    }

    /// Available items within `radius_km` of `center`, nearest first.
    pub async fn find_available_within(
        center: GeoPoint,
        radius_km: f64,
        category: Option<Category>,
        as_of: DateTime<Utc>,
        pool: &PgPool,
    ) -> AppResult<Vec<(Self, f64)>> {
        let rows = sqlx::query_as::<_, ItemDistanceRow>(
            "SELECT *
             FROM (
                SELECT i.*, haversine_distance($1, $2, i.latitude, i.longitude) AS distance_km
                FROM items i
                WHERE i.state = 'available'
                  AND (i.available_till IS NULL OR i.available_till > $5)
                  AND ($4::INT IS NULL OR i.category = $4)
             ) candidates
             WHERE distance_km <= $3
             ORDER BY distance_km ASC, created_at ASC, id ASC",
        )
        .bind(center.latitude)
        .bind(center.longitude)
        .bind(radius_km)
        .bind(category.map(|c| c.id()))
        .bind(as_of)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let distance = row.distance_km;
                Item::try_from(row.item)
                    .map(|item| (item, distance))
                    .map_err(AppError::from)
            })
            .collect()
    }

    /// Every item a samaritan has posted, most recently touched first.
    pub async fn find_posted_by(
        samaritan: UserId,
        category: Option<Category>,
        pool: &PgPool,
    ) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM items
             WHERE posted_by = $1
               AND ($2::INT IS NULL OR category = $2)
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(samaritan)
        .bind(category.map(|c| c.id()))
        .fetch_all(pool)
        .await?;

        into_items(rows)
    }

    /// Items reserved by an organization and not yet picked up.
    pub async fn find_held_by(
        organization: UserId,
        category: Option<Category>,
        pool: &PgPool,
    ) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM items
             WHERE reserved_by = $1
               AND state <> 'completed'
               AND ($2::INT IS NULL OR category = $2)
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(organization)
        .bind(category.map(|c| c.id()))
        .fetch_all(pool)
        .await?;

        into_items(rows)
    }

    /// Items an organization has picked up.
    pub async fn find_collected_by(
        organization: UserId,
        category: Option<Category>,
        pool: &PgPool,
    ) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM items
             WHERE picked_up_by = $1
               AND state = 'completed'
               AND ($2::INT IS NULL OR category = $2)
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(organization)
        .bind(category.map(|c| c.id()))
        .fetch_all(pool)
        .await?;

        into_items(rows)
    }

    /// Deadlines of every item that can still expire (active, not picked up).
    pub async fn find_pending_expiries(
        pool: &PgPool,
    ) -> AppResult<Vec<(ItemId, DateTime<Utc>)>> {
        let rows = sqlx::query_as::<_, (ItemId, DateTime<Utc>)>(
            "SELECT id, available_till FROM items
             WHERE state IN ('available', 'reserved')
               AND available_till IS NOT NULL
             ORDER BY available_till ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_flags() {
        let org = UserId::new();

        let available = ItemState::Available;
        assert!(available.is_active() && !available.is_reserved() && !available.is_picked_up());

        let reserved = ItemState::Reserved { by: org };
        assert!(reserved.is_active() && reserved.is_reserved() && !reserved.is_picked_up());
        assert_eq!(reserved.reserved_by(), Some(org));

        let completed = ItemState::Completed { by: org };
        assert!(completed.is_active() && completed.is_reserved() && completed.is_picked_up());
        assert_eq!(completed.picked_up_by(), completed.reserved_by());

        let withdrawn = ItemState::Withdrawn { reserved_by: None };
        assert!(!withdrawn.is_active() && !withdrawn.is_reserved());
    }

    #[test]
    fn test_state_round_trips_through_columns() {
        let org = UserId::new();
        for state in [
            ItemState::Available,
            ItemState::Reserved { by: org },
            ItemState::Completed { by: org },
            ItemState::Withdrawn { reserved_by: None },
            ItemState::Withdrawn {
                reserved_by: Some(org),
            },
        ] {
            let rebuilt =
                ItemState::from_parts(state.as_str(), state.reserved_by(), state.picked_up_by())
                    .unwrap();
            assert_eq!(rebuilt, state);
        }
    }

    #[test]
    fn test_inconsistent_columns_are_rejected() {
        let a = UserId::new();
        let b = UserId::new();
        assert!(ItemState::from_parts("reserved", None, None).is_err());
        assert!(ItemState::from_parts("completed", Some(a), Some(b)).is_err());
        assert!(ItemState::from_parts("available", Some(a), None).is_err());
        assert!(ItemState::from_parts("withdrawn", Some(a), Some(a)).is_err());
        assert!(ItemState::from_parts("bogus", None, None).is_err());
    }
}
