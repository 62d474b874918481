//! Input validation for item creation and listing queries.
//!
//! Every check runs before the store is touched. Each function returns the parsed
//! value or the first [`ValidationError`] it finds.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use super::data::{CreateItemInput, HistoryParams, ListingParams};
use super::models::{Category, Measure, PickupWindow, ALL_CATEGORIES_ID};
use crate::common::{GeoPoint, PageRequest, ValidationError};

type Validated<T> = Result<T, ValidationError>;

/// A donation that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub category: Category,
    pub description: String,
    pub pickup_location: GeoPoint,
    pub weight: Option<Measure>,
    pub volume: Option<Measure>,
    pub best_before: Option<NaiveDate>,
    pub pickup_window: PickupWindow,
    /// `None` means "use the configured lifetime".
    pub available_till: Option<DateTime<Utc>>,
}

/// Validated browse query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListingQuery {
    pub page: PageRequest,
    pub radius_km: f64,
    pub category: Option<Category>,
}

/// Validated owner-history query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryQuery {
    pub page: PageRequest,
    pub category: Option<Category>,
}

// =============================================================================
// Shared parsers
// =============================================================================

/// Accept a JSON number or a numeric string.
fn as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Location object with `latitude` and `longitude` within range.
pub fn validate_coordinates(location: &Value) -> Validated<GeoPoint> {
    let Value::Object(fields) = location else {
        return Err(ValidationError::new("Location must be a valid object"));
    };

    let (Some(latitude), Some(longitude)) = (
        fields.get("latitude").filter(|v| !v.is_null()),
        fields.get("longitude").filter(|v| !v.is_null()),
    ) else {
        return Err(ValidationError::new(
            "Location must include both latitude and longitude",
        ));
    };

    let (Some(latitude), Some(longitude)) = (as_f64(latitude), as_f64(longitude)) else {
        return Err(ValidationError::new(
            "Invalid coordinate values - must be valid numbers",
        ));
    };

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::new("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::new(
            "Longitude must be between -180 and 180",
        ));
    }

    Ok(GeoPoint::new(latitude, longitude))
}

/// Category an item can be posted under. "All" (0) is a filter, not a category.
pub fn validate_category(value: &Value) -> Validated<Category> {
    let options = Category::assignable_options;

    let id = as_i64(value)
        .ok_or_else(|| ValidationError::with_options("Category must be a number", options()))?;

    i32::try_from(id)
        .ok()
        .and_then(Category::from_id)
        .ok_or_else(|| ValidationError::with_options("Invalid category", options()))
}

/// Category filter from a query string. Absent or 0 means every category.
pub fn validate_category_filter(raw: Option<&str>) -> Validated<Option<Category>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let id: i32 = raw.parse().map_err(|_| {
        ValidationError::with_options("Category must be a number", Category::filter_options())
    })?;

    if id == ALL_CATEGORIES_ID {
        return Ok(None);
    }

    Category::from_id(id)
        .map(Some)
        .ok_or_else(|| ValidationError::with_options("Invalid category", Category::filter_options()))
}

/// `HH:MM` pickup window; start strictly before end when both are given.
pub fn validate_pickup_window(start: Option<&str>, end: Option<&str>) -> Validated<PickupWindow> {
    let parse = |raw: Option<&str>| -> Validated<Option<NaiveTime>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s, "%H:%M").map(Some).map_err(|_| {
                ValidationError::new("Invalid pickup window time format. Use HH:MM")
            }),
        }
    };

    let window = PickupWindow {
        start: parse(start)?,
        end: parse(end)?,
    };

    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start >= end {
            return Err(ValidationError::new(
                "Pickup window start must be before pickup window end",
            ));
        }
    }

    Ok(window)
}

/// `YYYY-MM-DD`, not before `today`.
pub fn validate_best_before(raw: Option<&str>, today: NaiveDate) -> Validated<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::new("Invalid best_before date format. Use YYYY-MM-DD")
    })?;

    if date < today {
        return Err(ValidationError::new(
            "Best before date cannot be in the past",
        ));
    }

    Ok(Some(date))
}

/// RFC 3339 deadline strictly after `now`.
pub fn validate_available_till(
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Validated<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let till = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ValidationError::new(
                "Invalid available_till format. Use RFC 3339 (e.g. 2025-01-31T18:00:00Z)",
            )
        })?;

    if till <= now {
        return Err(ValidationError::new("Available till must be in the future"));
    }

    Ok(Some(till))
}

/// Optional weight or volume; positive when present.
fn validate_measure(
    label: &str,
    value: Option<&Value>,
    unit: Option<&String>,
) -> Validated<Option<Measure>> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let value =
        as_f64(value).ok_or_else(|| ValidationError::new("Invalid weight or volume format"))?;
    if value <= 0.0 {
        return Err(ValidationError::new(format!("{} must be positive", label)));
    }

    Ok(Some(Measure {
        value,
        unit: unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
    }))
}

// =============================================================================
// Request validators
// =============================================================================

/// Validate a donation request in field order, stopping at the first problem.
pub fn validate_new_item(input: &CreateItemInput, now: DateTime<Utc>) -> Validated<NewItem> {
    let mut missing = Vec::new();
    if input.category.as_ref().map_or(true, Value::is_null) {
        missing.push("category");
    }
    if input.description.is_none() {
        missing.push("description");
    }
    if input.pickup_location.as_ref().map_or(true, Value::is_null) {
        missing.push("pickup_location");
    }
    if !missing.is_empty() {
        return Err(ValidationError::new(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let category = validate_category(input.category.as_ref().unwrap_or(&Value::Null))?;

    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if description.is_empty() {
        return Err(ValidationError::new("Description cannot be empty"));
    }

    let pickup_location =
        validate_coordinates(input.pickup_location.as_ref().unwrap_or(&Value::Null))?;

    let weight = validate_measure("Weight", input.weight.as_ref(), input.weight_unit.as_ref())?;
    let volume = validate_measure("Volume", input.volume.as_ref(), input.volume_unit.as_ref())?;

    let best_before = validate_best_before(input.best_before.as_deref(), now.date_naive())?;

    let pickup_window = validate_pickup_window(
        input.pickup_window_start.as_deref(),
        input.pickup_window_end.as_deref(),
    )?;

    let available_till = validate_available_till(input.available_till.as_deref(), now)?;

    Ok(NewItem {
        category,
        description,
        pickup_location,
        weight,
        volume,
        best_before,
        pickup_window,
        available_till,
    })
}

fn parse_positive_count(
    raw: Option<&str>,
    default: usize,
    invalid: &str,
    non_positive: &str,
) -> Validated<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };

    let n: i64 = raw.parse().map_err(|_| ValidationError::new(invalid))?;
    if n <= 0 {
        return Err(ValidationError::new(non_positive));
    }

    usize::try_from(n).map_err(|_| ValidationError::new(invalid))
}

fn validate_page_request(
    page: Option<&str>,
    items_per_page: Option<&str>,
    default_per_page: usize,
) -> Validated<PageRequest> {
    let per_page = parse_positive_count(
        items_per_page,
        default_per_page,
        "Invalid items_per_page parameter",
        "Items per page must be positive",
    )?;
    let page = parse_positive_count(
        page,
        1,
        "Invalid page number",
        "Page number must be positive",
    )?;

    Ok(PageRequest::new(page, per_page))
}

/// Radius in kilometers; must be a positive number.
pub fn validate_radius(raw: Option<&str>, default_km: f64) -> Validated<f64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default_km);
    };

    let radius: f64 = raw
        .parse()
        .ok()
        .filter(|r: &f64| r.is_finite())
        .ok_or_else(|| ValidationError::new("Invalid radius parameter"))?;
    if radius <= 0.0 {
        return Err(ValidationError::new("Radius must be positive"));
    }

    Ok(radius)
}

pub fn validate_listing_params(
    params: &ListingParams,
    default_per_page: usize,
    default_radius_km: f64,
) -> Validated<ListingQuery> {
    Ok(ListingQuery {
        page: validate_page_request(
            params.page.as_deref(),
            params.items_per_page.as_deref(),
            default_per_page,
        )?,
        radius_km: validate_radius(params.radius.as_deref(), default_radius_km)?,
        category: validate_category_filter(params.category.as_deref())?,
    })
}

pub fn validate_history_params(
    params: &HistoryParams,
    default_per_page: usize,
) -> Validated<HistoryQuery> {
    Ok(HistoryQuery {
        page: validate_page_request(
            params.page.as_deref(),
            params.items_per_page.as_deref(),
            default_per_page,
        )?,
        category: validate_category_filter(params.category.as_deref())?,
    })
}
