use serde::Deserialize;
use serde_json::Value;

/// Item donation request body.
///
/// Fields stay loosely typed so the validators can report precise messages
/// (e.g. a category sent as `"abc"` is "Category must be a number", not a JSON error).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItemInput {
    pub category: Option<Value>,
    pub description: Option<String>,
    pub pickup_location: Option<Value>,
    pub weight: Option<Value>,
    pub weight_unit: Option<String>,
    pub volume: Option<Value>,
    pub volume_unit: Option<String>,
    /// `YYYY-MM-DD`
    pub best_before: Option<String>,
    /// `HH:MM`
    pub pickup_window_start: Option<String>,
    /// `HH:MM`
    pub pickup_window_end: Option<String>,
    /// RFC 3339 timestamp
    pub available_till: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Inline image attached to a donation.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub filename: String,
    /// Base64-encoded file contents
    pub content: String,
}

/// Raw query string of the browse endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub items_per_page: Option<String>,
    pub radius: Option<String>,
    pub category: Option<String>,
}

/// Raw query string of the owner-scoped history endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<String>,
    pub items_per_page: Option<String>,
    pub category: Option<String>,
}
