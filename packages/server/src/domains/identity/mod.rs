//! Identity domain - samaritans and organizations
//!
//! Role is decided once when an actor is loaded; everything downstream matches on
//! `Role` / `Caller` instead of comparing role strings.

pub mod actions;
pub mod data;
pub mod models;
pub mod validation;

pub use actions::{register_organization, register_samaritan};
pub use data::{AddressInput, OrganizationSignupInput, SamaritanSignupInput};
pub use models::{
    Actor, Caller, Identity, OrganizationProfile, PartySummary, PostalAddress, Role, RoleKind,
    SamaritanProfile,
};
