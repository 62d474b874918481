//! Signup validation.
//!
//! Checks run in a fixed order and stop at the first failure: required fields,
//! coordinates, postal code, province, then email and username uniqueness.

use lazy_static::lazy_static;
use regex::Regex;

use super::data::{OrganizationSignupInput, SamaritanSignupInput};
use super::models::{
    Actor, Identity, OrganizationProfile, PostalAddress, Role, SamaritanProfile,
};
use crate::common::{AppResult, UserId, ValidationError};
use crate::domains::items::validation::validate_coordinates;
use crate::kernel::BaseIdentityStore;

lazy_static! {
    static ref POSTAL_CODE_REGEX: Regex = Regex::new(r"^[A-Z][0-9][A-Z]\s?[0-9][A-Z][0-9]$").unwrap();
}

pub const PROVINCES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn require_fields(fields: &[(&str, bool)]) -> Result<(), ValidationError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Required fields missing: {}",
            missing.join(", ")
        )))
    }
}

/// Canadian postal code, normalized to upper case `A1A 1A1`.
pub fn validate_postal_code(raw: Option<&str>) -> Result<String, ValidationError> {
    let Some(code) = raw.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) else {
        return Err(ValidationError::new("Postal code is required"));
    };

    if !POSTAL_CODE_REGEX.is_match(&code) {
        return Err(ValidationError::new(
            "Invalid postal code format. Must be in format A1A 1A1",
        ));
    }

    let compact: Vec<char> = code.chars().filter(|c| !c.is_whitespace()).collect();
    let (forward, local) = compact.split_at(3);
    Ok(format!(
        "{} {}",
        forward.iter().collect::<String>(),
        local.iter().collect::<String>()
    ))
}

/// Two-letter province or territory code, normalized to upper case.
pub fn validate_province(raw: Option<&str>) -> Result<String, ValidationError> {
    let Some(province) = raw.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) else {
        return Err(ValidationError::new("Province is required"));
    };

    if !PROVINCES.contains(&province.as_str()) {
        return Err(ValidationError::new("Invalid province code"));
    }

    Ok(province)
}

/// Email first, then username.
pub async fn validate_unique_user(
    email: &str,
    username: &str,
    store: &dyn BaseIdentityStore,
) -> AppResult<()> {
    if store.email_taken(email).await? {
        return Err(ValidationError::new("A user with this email already exists").into());
    }
    if store.username_taken(username).await? {
        return Err(ValidationError::new("A user with this username already exists").into());
    }
    Ok(())
}

/// Validate an organization signup and build the actor to store.
pub async fn validate_organization_signup(
    input: &OrganizationSignupInput,
    store: &dyn BaseIdentityStore,
) -> AppResult<Actor> {
    let address = &input.address;
    require_fields(&[
        ("username", present(&input.username).is_some()),
        ("email", present(&input.email).is_some()),
        ("location", input.location.as_ref().is_some_and(|v| !v.is_null())),
        ("name", present(&input.name).is_some()),
        ("address_line1", present(&address.address_line1).is_some()),
        ("city", present(&address.city).is_some()),
        ("province", present(&address.province).is_some()),
        ("postal_code", present(&address.postal_code).is_some()),
    ])?;

    let location = validate_coordinates(input.location.as_ref().unwrap_or(&serde_json::Value::Null))?;
    let postal_code = validate_postal_code(address.postal_code.as_deref())?;
    let province = validate_province(address.province.as_deref())?;

    let username = present(&input.username).unwrap_or_default().to_string();
    let email = present(&input.email).unwrap_or_default().to_string();
    validate_unique_user(&email, &username, store).await?;

    Ok(Actor {
        identity: Identity {
            id: UserId::new(),
            username,
            email,
        },
        role: Role::Organization(OrganizationProfile {
            name: present(&input.name).unwrap_or_default().to_string(),
            location,
            address: PostalAddress {
                line1: present(&address.address_line1).unwrap_or_default().to_string(),
                line2: present(&address.address_line2).map(str::to_string),
                city: present(&address.city).unwrap_or_default().to_string(),
                province,
                postal_code,
            },
        }),
    })
}

/// Validate a samaritan signup and build the actor to store.
pub async fn validate_samaritan_signup(
    input: &SamaritanSignupInput,
    store: &dyn BaseIdentityStore,
) -> AppResult<Actor> {
    let address = &input.address;
    require_fields(&[
        ("username", present(&input.username).is_some()),
        ("email", present(&input.email).is_some()),
        ("city", present(&address.city).is_some()),
        ("province", present(&address.province).is_some()),
    ])?;

    let province = validate_province(address.province.as_deref())?;

    let username = present(&input.username).unwrap_or_default().to_string();
    let email = present(&input.email).unwrap_or_default().to_string();
    validate_unique_user(&email, &username, store).await?;

    Ok(Actor {
        identity: Identity {
            id: UserId::new(),
            username,
            email,
        },
        role: Role::Samaritan(SamaritanProfile {
            city: present(&address.city).unwrap_or_default().to_string(),
            province,
            rating: 0.0,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code_is_normalized() {
        assert_eq!(validate_postal_code(Some("m5v3l9")).unwrap(), "M5V 3L9");
        assert_eq!(validate_postal_code(Some(" K1A 0B1 ")).unwrap(), "K1A 0B1");
    }

    #[test]
    fn test_postal_code_rejects_bad_shapes() {
        let err = validate_postal_code(Some("12345")).unwrap_err();
        assert_eq!(err.message, "Invalid postal code format. Must be in format A1A 1A1");

        let err = validate_postal_code(Some("A\u{0966}A \u{0966}A\u{0966}")).unwrap_err();
        assert_eq!(err.message, "Invalid postal code format. Must be in format A1A 1A1");

        let err = validate_postal_code(Some("   ")).unwrap_err();
        assert_eq!(err.message, "Postal code is required");
    }

    #[test]
    fn test_province_codes() {
        assert_eq!(validate_province(Some("on")).unwrap(), "ON");
        assert_eq!(validate_province(Some("YT")).unwrap(), "YT");
        assert_eq!(
            validate_province(Some("XX")).unwrap_err().message,
            "Invalid province code"
        );
        assert_eq!(
            validate_province(None).unwrap_err().message,
            "Province is required"
        );
    }

    #[test]
    fn test_required_fields_are_listed_together() {
        let err = require_fields(&[("username", true), ("email", false), ("name", false)])
            .unwrap_err();
        assert_eq!(err.message, "Required fields missing: email, name");
    }
}
