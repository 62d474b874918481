pub mod item;
pub mod types;

pub use item::{
    party_ids, CategoriesData, CategoryData, DonationsData, ItemData, ItemResponse,
    ListingsData, MeasureData, OrganizationItemsData, PartyData, Parties, PickupWindowData,
};
pub use types::{CreateItemInput, HistoryParams, ImageUpload, ListingParams};
