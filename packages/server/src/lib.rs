// Donation matching server - core library
//
// Samaritans post surplus items; organizations browse what is nearby, reserve it,
// and pick it up. Each domain keeps its models, validation and actions together under
// domains/*; kernel/ holds the store traits and their Postgres and in-memory backends.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
