use serde::Deserialize;
use serde_json::Value;

/// Mailing address as submitted at signup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

/// Organization signup profile. Credentials are handled by the auth provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationSignupInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// `{latitude, longitude}`
    pub location: Option<Value>,
    #[serde(default)]
    pub address: AddressInput,
}

/// Samaritan signup profile. Credentials are handled by the auth provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SamaritanSignupInput {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub address: AddressInput,
}
