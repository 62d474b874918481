// HTTP routes
pub mod categories;
pub mod health;
pub mod items;
pub mod listings;

pub use categories::*;
pub use health::*;
pub use items::*;
pub use listings::*;
