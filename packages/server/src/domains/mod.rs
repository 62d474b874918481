// Business domains
pub mod auth;
pub mod identity;
pub mod items;
