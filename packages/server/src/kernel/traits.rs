// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Lifecycle rules live in `domains::items::machines`; stores only persist what
// the machine decides.
//
// Naming convention: Base* for trait names (e.g., BaseItemStore, BaseGeoIndex)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{AppResult, GeoPoint, ItemId, UserId};
use crate::domains::identity::{Actor, PartySummary};
use crate::domains::items::data::ImageUpload;
use crate::domains::items::models::{Category, Item, ItemState};

// =============================================================================
// Item Store Trait (Infrastructure - persistence)
// =============================================================================

/// Guard + next-state callback run under the item's lock.
pub type DecideFn<'a> = &'a (dyn Fn(&Item) -> AppResult<Option<ItemState>> + Send + Sync);

/// Outcome of [`BaseItemStore::update_locked`].
#[derive(Debug, Clone)]
pub struct LockedUpdate {
    /// The item after the update (or as read, when nothing changed)
    pub item: Item,
    pub changed: bool,
}

#[async_trait]
pub trait BaseItemStore: Send + Sync {
    async fn insert(&self, item: &Item) -> AppResult<()>;

    /// Hard delete. Only used to roll back a creation.
    async fn delete(&self, id: ItemId) -> AppResult<()>;

    async fn set_image(&self, id: ItemId, image: &str) -> AppResult<Item>;

    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>>;

    /// Atomic read-modify-write.
    ///
    /// Holds an exclusive lock on the item from the read until the write is durable.
    /// Concurrent calls for the same item are serialized; different items do not block
    /// each other. `NotFound` when the item does not exist.
    async fn update_locked(&self, id: ItemId, decide: DecideFn<'_>) -> AppResult<LockedUpdate>;

    /// Items posted by a samaritan, `updated_at` descending then id descending.
    async fn find_posted_by(
        &self,
        samaritan: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>>;

    /// Items reserved by an organization and not yet picked up. Same ordering.
    async fn find_held_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>>;

    /// Items picked up by an organization. Same ordering.
    async fn find_collected_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>>;

    /// `(id, available_till)` of every active, not-picked-up item with a deadline.
    async fn find_pending_expiries(&self) -> AppResult<Vec<(ItemId, DateTime<Utc>)>>;
}

// =============================================================================
// Geo Index Trait (Infrastructure - proximity queries)
// =============================================================================

/// Restricts a radius query to listable items.
#[derive(Debug, Clone, Copy)]
pub struct ListingFilter {
    pub category: Option<Category>,
    /// Items whose deadline is at or before this instant are excluded.
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GeoHit {
    pub item: Item,
    pub distance_km: f64,
}

#[async_trait]
pub trait BaseGeoIndex: Send + Sync {
    /// Available items within `radius_km` of `center`, ordered by distance ascending,
    /// then `created_at`, then id.
    async fn within_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filter: ListingFilter,
    ) -> AppResult<Vec<GeoHit>>;
}

// =============================================================================
// Identity Store Trait (Infrastructure - users)
// =============================================================================

#[async_trait]
pub trait BaseIdentityStore: Send + Sync {
    async fn find_actor(&self, id: UserId) -> AppResult<Option<Actor>>;

    /// Public summaries for the given ids. Unknown ids are omitted.
    async fn find_parties(&self, ids: &[UserId]) -> AppResult<Vec<PartySummary>>;

    async fn email_taken(&self, email: &str) -> AppResult<bool>;

    async fn username_taken(&self, username: &str) -> AppResult<bool>;

    async fn insert_actor(&self, actor: &Actor) -> AppResult<()>;
}

// =============================================================================
// Image Store Trait (Infrastructure - media)
// =============================================================================

#[async_trait]
pub trait BaseImageStore: Send + Sync {
    /// Persist an image for `item_id` and return its public reference.
    async fn store(&self, item_id: ItemId, upload: &ImageUpload) -> Result<String>;

    /// Delete a previously stored image. Unknown references are ignored.
    async fn remove(&self, reference: &str) -> Result<()>;
}

// =============================================================================
// Expiry Scheduler Trait (Infrastructure - deferred work)
// =============================================================================

#[async_trait]
pub trait BaseExpiryScheduler: Send + Sync {
    /// Arrange for the item to be expired at or after `fires_at`.
    ///
    /// Firing more than once is harmless; expiry is idempotent.
    async fn schedule(&self, item_id: ItemId, fires_at: DateTime<Utc>) -> Result<()>;
}
