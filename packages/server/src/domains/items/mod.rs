//! Items domain - donated items, their reservation lifecycle, and proximity listings
//!
//! Architecture:
//!   HTTP route → action → machines::decide (under the store's row lock) → store

pub mod actions;
pub mod data;
pub mod machines;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use actions::*;
pub use data::{
    CategoriesData, CreateItemInput, DonationsData, HistoryParams, ItemData, ItemResponse,
    ListingParams, ListingsData, OrganizationItemsData,
};
pub use machines::Transition;
pub use models::{Category, Item, ItemState};
