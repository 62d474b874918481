pub mod category;
pub mod item;

pub use category::{Category, ALL_CATEGORIES_ID};
pub use item::{Item, ItemState, Measure, PickupWindow};
