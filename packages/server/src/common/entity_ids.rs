//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for donated items.
pub struct Item;

/// Marker type for user identities (samaritans and organizations share one id space).
pub struct User;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for donated items.
pub type ItemId = Id<Item>;

/// Typed ID for user identities.
pub type UserId = Id<User>;
