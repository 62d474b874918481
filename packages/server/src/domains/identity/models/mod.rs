pub mod account;
pub mod actor;

pub use actor::{
    Actor, Caller, Identity, OrganizationProfile, PartySummary, PostalAddress, Role, RoleKind,
    SamaritanProfile,
};
