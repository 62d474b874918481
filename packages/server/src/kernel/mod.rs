//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod expiry;
pub mod images;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ItemSettings, ServerDeps};
pub use expiry::TokioExpiryScheduler;
pub use images::LocalImageStore;
pub use postgres_store::{PostgresIdentityStore, PostgresItemStore};
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
