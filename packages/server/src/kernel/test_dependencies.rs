// TestDependencies - in-memory implementations for testing
//
// Provides stores and spies that can be injected into ServerDeps for tests.
// The in-memory item store honours the same locking contract as Postgres: its mutex
// is held from the read through the write in `update_locked`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    BaseExpiryScheduler, BaseGeoIndex, BaseIdentityStore, BaseImageStore, BaseItemStore,
    DecideFn, GeoHit, ItemSettings, ListingFilter, LockedUpdate, ServerDeps,
    TokioExpiryScheduler,
};
use crate::common::{AppError, AppResult, GeoPoint, ItemId, UserId};
use crate::domains::identity::{Actor, PartySummary};
use crate::domains::items::data::ImageUpload;
use crate::domains::items::models::{Category, Item};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Newest `updated_at` first, then id descending.
fn history_order(a: &Item, b: &Item) -> Ordering {
    b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id))
}

// =============================================================================
// In-memory Item Store + Geo Index
// =============================================================================

#[derive(Default)]
pub struct InMemoryItemStore {
    items: Mutex<HashMap<ItemId, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored item
    pub fn all(&self) -> Vec<Item> {
        lock(&self.items).values().cloned().collect()
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        lock(&self.items).get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored item directly (test setup only)
    pub fn put(&self, item: Item) {
        lock(&self.items).insert(item.id, item);
    }

    fn filtered(
        &self,
        category: Option<Category>,
        keep: impl Fn(&Item) -> bool,
    ) -> Vec<Item> {
        let mut items: Vec<Item> = lock(&self.items)
            .values()
            .filter(|item| category.map_or(true, |c| item.category == c))
            .filter(|item| keep(item))
            .cloned()
            .collect();
        items.sort_by(history_order);
        items
    }
}

#[async_trait]
impl BaseItemStore for InMemoryItemStore {
    async fn insert(&self, item: &Item) -> AppResult<()> {
        lock(&self.items).insert(item.id, item.clone());
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> AppResult<()> {
        lock(&self.items).remove(&id);
        Ok(())
    }

    async fn set_image(&self, id: ItemId, image: &str) -> AppResult<Item> {
        let mut items = lock(&self.items);
        let item = items
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Item not found"))?;
        item.image = Some(image.to_string());
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn find_by_id(&self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.get(id))
    }

    async fn update_locked(&self, id: ItemId, decide: DecideFn<'_>) -> AppResult<LockedUpdate> {
        let mut items = lock(&self.items);
        let item = items
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Item not found"))?;

        match decide(item)? {
            Some(next) => {
                item.state = next;
                item.updated_at = Utc::now();
                Ok(LockedUpdate {
                    item: item.clone(),
                    changed: true,
                })
            }
            None => Ok(LockedUpdate {
                item: item.clone(),
                changed: false,
            }),
        }
    }

    async fn find_posted_by(
        &self,
        samaritan: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Ok(self.filtered(category, |item| item.posted_by == samaritan))
    }

    async fn find_held_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Ok(self.filtered(category, |item| item.is_held_by(organization)))
    }

    async fn find_collected_by(
        &self,
        organization: UserId,
        category: Option<Category>,
    ) -> AppResult<Vec<Item>> {
        Ok(self.filtered(category, |item| item.is_collected_by(organization)))
    }

    async fn find_pending_expiries(&self) -> AppResult<Vec<(ItemId, DateTime<Utc>)>> {
        let mut pending: Vec<(ItemId, DateTime<Utc>)> = lock(&self.items)
            .values()
            .filter(|item| item.awaits_expiry())
            .filter_map(|item| item.available_till.map(|till| (item.id, till)))
            .collect();
        pending.sort_by_key(|(_, till)| *till);
        Ok(pending)
    }
}

#[async_trait]
impl BaseGeoIndex for InMemoryItemStore {
    async fn within_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filter: ListingFilter,
    ) -> AppResult<Vec<GeoHit>> {
        let mut hits: Vec<GeoHit> = lock(&self.items)
            .values()
            .filter(|item| item.is_listable(filter.as_of))
            .filter(|item| filter.category.map_or(true, |c| item.category == c))
            .map(|item| GeoHit {
                distance_km: center.distance_km(&item.pickup_location),
                item: item.clone(),
            })
            .filter(|hit| hit.distance_km <= radius_km)
            .collect();

        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.item.created_at.cmp(&b.item.created_at))
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        Ok(hits)
    }
}

// =============================================================================
// In-memory Identity Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryIdentityStore {
    actors: Mutex<Vec<Actor>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseIdentityStore for InMemoryIdentityStore {
    async fn find_actor(&self, id: UserId) -> AppResult<Option<Actor>> {
        Ok(lock(&self.actors).iter().find(|a| a.id() == id).cloned())
    }

    async fn find_parties(&self, ids: &[UserId]) -> AppResult<Vec<PartySummary>> {
        Ok(lock(&self.actors)
            .iter()
            .filter(|a| ids.contains(&a.id()))
            .map(PartySummary::from)
            .collect())
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(lock(&self.actors)
            .iter()
            .any(|a| a.identity.email.eq_ignore_ascii_case(email)))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(lock(&self.actors)
            .iter()
            .any(|a| a.identity.username == username))
    }

    async fn insert_actor(&self, actor: &Actor) -> AppResult<()> {
        lock(&self.actors).push(actor.clone());
        Ok(())
    }
}

// =============================================================================
// Mock Image Store
// =============================================================================

/// Records stored images; can be told to fail.
#[derive(Default)]
pub struct MockImageStore {
    stored: Mutex<Vec<(ItemId, String)>>,
    fail: AtomicBool,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, AtomicOrdering::SeqCst);
        store
    }

    pub fn stored(&self) -> Vec<(ItemId, String)> {
        lock(&self.stored).clone()
    }
}

#[async_trait]
impl BaseImageStore for MockImageStore {
    async fn store(&self, item_id: ItemId, upload: &ImageUpload) -> Result<String> {
        if self.fail.load(AtomicOrdering::SeqCst) {
            bail!("image storage unavailable");
        }
        let reference = format!("item_images/{}-{}", item_id, upload.filename);
        lock(&self.stored).push((item_id, reference.clone()));
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        lock(&self.stored).retain(|(_, stored)| stored != reference);
        Ok(())
    }
}

// =============================================================================
// Spy Expiry Scheduler
// =============================================================================

/// Records schedule calls without firing anything.
#[derive(Default)]
pub struct SpyExpiryScheduler {
    scheduled: Mutex<Vec<(ItemId, DateTime<Utc>)>>,
    fail: AtomicBool,
}

impl SpyExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose every call fails
    pub fn failing() -> Self {
        let scheduler = Self::default();
        scheduler.fail.store(true, AtomicOrdering::SeqCst);
        scheduler
    }

    pub fn scheduled(&self) -> Vec<(ItemId, DateTime<Utc>)> {
        lock(&self.scheduled).clone()
    }

    pub fn was_scheduled(&self, item_id: ItemId) -> bool {
        lock(&self.scheduled).iter().any(|(id, _)| *id == item_id)
    }
}

#[async_trait]
impl BaseExpiryScheduler for SpyExpiryScheduler {
    async fn schedule(&self, item_id: ItemId, fires_at: DateTime<Utc>) -> Result<()> {
        if self.fail.load(AtomicOrdering::SeqCst) {
            bail!("scheduler unavailable");
        }
        lock(&self.scheduled).push((item_id, fires_at));
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub items: Arc<InMemoryItemStore>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub images: Arc<MockImageStore>,
    pub expiry: Arc<SpyExpiryScheduler>,
    pub settings: ItemSettings,
    use_tokio_timers: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            items: Arc::new(InMemoryItemStore::new()),
            identities: Arc::new(InMemoryIdentityStore::new()),
            images: Arc::new(MockImageStore::new()),
            expiry: Arc::new(SpyExpiryScheduler::new()),
            settings: ItemSettings::default(),
            use_tokio_timers: false,
        }
    }

    /// Set a mock image store
    pub fn mock_images(mut self, images: MockImageStore) -> Self {
        self.images = Arc::new(images);
        self
    }

    /// Set a spy expiry scheduler
    pub fn mock_expiry(mut self, expiry: SpyExpiryScheduler) -> Self {
        self.expiry = Arc::new(expiry);
        self
    }

    /// Fire real tokio timers against the in-memory store instead of recording
    pub fn tokio_timers(mut self) -> Self {
        self.use_tokio_timers = true;
        self
    }

    pub fn settings(mut self, settings: ItemSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn server_deps(&self) -> ServerDeps {
        let expiry: Arc<dyn BaseExpiryScheduler> = if self.use_tokio_timers {
            Arc::new(TokioExpiryScheduler::new(self.items.clone()))
        } else {
            self.expiry.clone()
        };

        ServerDeps::new(
            self.items.clone(),
            self.items.clone(),
            self.identities.clone(),
            self.images.clone(),
            expiry,
            self.settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
