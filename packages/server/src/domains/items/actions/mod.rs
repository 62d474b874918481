//! Item domain actions - business logic functions
//!
//! Actions are async functions called directly from HTTP handlers and background
//! tasks. They validate, delegate state decisions to `machines`, and persist
//! through the store traits in `ServerDeps`.

mod create_item;
mod expire;
mod queries;
mod transitions;

pub use create_item::create_item;
pub use expire::{expire_item, expire_overdue_items, rearm_pending_expiries, ExpiryOutcome};
pub use queries::{
    browse_listings, list_categories, load_parties, organization_items, samaritan_donations,
};
pub use transitions::{pickup_item, reserve_item, unreserve_item};
