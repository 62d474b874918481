//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by every domain action.
//! All external collaborators use trait abstractions so tests can swap in the
//! in-memory implementations from `test_dependencies`.

use std::sync::Arc;

use chrono::Duration;

use crate::kernel::{
    BaseExpiryScheduler, BaseGeoIndex, BaseIdentityStore, BaseImageStore, BaseItemStore,
};

/// Tunables for item creation and listings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSettings {
    pub default_radius_km: f64,
    pub items_per_page: usize,
    pub history_items_per_page: usize,
    /// Default `available_till` offset for new items.
    pub item_lifetime: Duration,
}

impl Default for ItemSettings {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            items_per_page: 25,
            history_items_per_page: 10,
            item_lifetime: Duration::days(14),
        }
    }
}

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub items: Arc<dyn BaseItemStore>,
    pub geo_index: Arc<dyn BaseGeoIndex>,
    pub identities: Arc<dyn BaseIdentityStore>,
    pub images: Arc<dyn BaseImageStore>,
    pub expiry: Arc<dyn BaseExpiryScheduler>,
    pub settings: ItemSettings,
}

impl ServerDeps {
    pub fn new(
        items: Arc<dyn BaseItemStore>,
        geo_index: Arc<dyn BaseGeoIndex>,
        identities: Arc<dyn BaseIdentityStore>,
        images: Arc<dyn BaseImageStore>,
        expiry: Arc<dyn BaseExpiryScheduler>,
        settings: ItemSettings,
    ) -> Self {
        Self {
            items,
            geo_index,
            identities,
            images,
            expiry,
            settings,
        }
    }
}
