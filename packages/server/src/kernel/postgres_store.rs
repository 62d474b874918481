//! Postgres-backed stores. Thin adapters over the model SQL methods.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{AppResult, GeoPoint, ItemId, UserId};
use crate::domains::identity::{Actor, PartySummary};
use crate::domains::items::models::{Category, Item};
use crate::kernel::{
    BaseGeoIndex, BaseIdentityStore, BaseItemStore, DecideFn, GeoHit, ListingFilter,
    LockedUpdate,
};

/// Item persistence and proximity queries over the `items` table.
#[derive(Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseItemStore for PostgresItemStore {
    async fn insert(&self, item: &Item) -> AppResult<()> {
        item.insert(&self.pool).await
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        Item::delete(id, &self.pool).await
    }

    async fn set_image(&self, id: ItemId, image: &str) -> AppResult<Item> {
        Item::set_image(id, image, &self.pool).await
    }

    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>> {
        Item::find_by_id(id, &self.pool).await
    }

    async fn update_locked(&self, id: ItemId, decide: DecideFn<'_>) -> AppResult<LockedUpdate> {
        let (item, changed) = Item::update_locked(id, decide, &self.pool).await?;
        Ok(LockedUpdate { item, changed })
    }

    async fn find_posted_by(
        &self,
        samaritan: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Item::find_posted_by(samaritan, category, &self.pool).await
    }

    async fn find_held_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Item::find_held_by(organization, category, &self.pool).await
    }

    async fn find_collected_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Item::find_collected_by(organization, category, &self.pool).await
    }

    async fn find_pending_expiries(&self) -> AppResult<Vec<(ItemId, DateTime<Utc>)>> {
        Item::find_pending_expiries(&self.pool).await
    }
}

#[async_trait]
impl BaseGeoIndex for PostgresItemStore {
    async fn within_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filter: ListingFilter,
    ) -> AppResult<Vec<GeoHit>> {
        let rows =
            Item::find_available_within(center, radius_km, filter.category, filter.as_of, &self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(item, distance_km)| GeoHit { item, distance_km })
            .collect())
    }
}

/// Actor lookups over `users` and the profile tables.
#[derive(Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseIdentityStore for PostgresIdentityStore {
    async fn find_actor(&self, id: UserId) -> AppResult<Option<Actor>> {
        Actor::find_by_id(id, &self.pool).await
    }

    async fn find_parties(&self, ids: &[UserId]) -> AppResult<Vec<PartySummary>> {
        let actors = Actor::find_by_ids(ids, &self.pool).await?;
        Ok(actors.iter().map(PartySummary::from).collect())
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Actor::email_exists(email, &self.pool).await
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Actor::username_exists(username, &self.pool).await
    }

    async fn insert_actor(&self, actor: &Actor) -> AppResult<()> {
        actor.insert(&self.pool).await
    }
}
