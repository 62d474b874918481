use serde::{Deserialize, Serialize};

use crate::common::{GeoPoint, UserId};

/// Account fields shared by every role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Canadian mailing address. Postal code is stored normalized ("A1A 1A1").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamaritanProfile {
    pub city: String,
    pub province: String,
    /// 0.00 - 5.00
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: String,
    /// Registered location; origin of every proximity search the organization runs.
    pub location: GeoPoint,
    pub address: PostalAddress,
}

/// Role-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Role {
    Samaritan(SamaritanProfile),
    Organization(OrganizationProfile),
}

/// Discriminant of [`Role`], used where only the kind matters (tokens, storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Samaritan,
    Organization,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Samaritan => "samaritan",
            RoleKind::Organization => "organization",
        }
    }
}

impl std::str::FromStr for RoleKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "samaritan" => Ok(RoleKind::Samaritan),
            "organization" => Ok(RoleKind::Organization),
            other => Err(anyhow::anyhow!("unknown role: {}", other)),
        }
    }
}

/// A loaded user with their role decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub identity: Identity,
    pub role: Role,
}

impl Actor {
    pub fn id(&self) -> UserId {
        self.identity.id
    }

    pub fn kind(&self) -> RoleKind {
        match self.role {
            Role::Samaritan(_) => RoleKind::Samaritan,
            Role::Organization(_) => RoleKind::Organization,
        }
    }

    pub fn caller(&self) -> Caller {
        Caller::new(self.kind(), self.id())
    }

    pub fn as_organization(&self) -> Option<&OrganizationProfile> {
        match &self.role {
            Role::Organization(profile) => Some(profile),
            Role::Samaritan(_) => None,
        }
    }

    /// Public display name: organization name, or username for samaritans.
    pub fn display_name(&self) -> &str {
        match &self.role {
            Role::Organization(profile) => &profile.name,
            Role::Samaritan(_) => &self.identity.username,
        }
    }
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    Samaritan(UserId),
    Organization(UserId),
}

impl Caller {
    pub fn new(kind: RoleKind, id: UserId) -> Self {
        match kind {
            RoleKind::Samaritan => Caller::Samaritan(id),
            RoleKind::Organization => Caller::Organization(id),
        }
    }

    pub fn id(&self) -> UserId {
        match self {
            Caller::Samaritan(id) | Caller::Organization(id) => *id,
        }
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            Caller::Samaritan(_) => RoleKind::Samaritan,
            Caller::Organization(_) => RoleKind::Organization,
        }
    }
}

/// Public summary of a user shown next to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySummary {
    pub id: UserId,
    pub username: String,
    /// Organization name; `None` for samaritans.
    pub name: Option<String>,
}

impl From<&Actor> for PartySummary {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id(),
            username: actor.identity.username.clone(),
            name: actor.as_organization().map(|org| org.name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organization() -> Actor {
        Actor {
            identity: Identity {
                id: UserId::new(),
                username: "foodbank".into(),
                email: "hello@foodbank.ca".into(),
            },
            role: Role::Organization(OrganizationProfile {
                name: "Downtown Food Bank".into(),
                location: GeoPoint::new(43.65, -79.38),
                address: PostalAddress {
                    line1: "1 Front St".into(),
                    line2: None,
                    city: "Toronto".into(),
                    province: "ON".into(),
                    postal_code: "M5J 2X5".into(),
                },
            }),
        }
    }

    #[test]
    fn test_caller_projection() {
        let actor = organization();
        assert_eq!(actor.caller(), Caller::Organization(actor.id()));
        assert_eq!(actor.kind(), RoleKind::Organization);
        assert_eq!(actor.display_name(), "Downtown Food Bank");
    }

    #[test]
    fn test_role_kind_parses() {
        assert_eq!("samaritan".parse::<RoleKind>().unwrap(), RoleKind::Samaritan);
        assert_eq!(
            "organization".parse::<RoleKind>().unwrap(),
            RoleKind::Organization
        );
        assert!("admin".parse::<RoleKind>().is_err());
    }

    #[test]
    fn test_party_summary_includes_org_name() {
        let summary = PartySummary::from(&organization());
        assert_eq!(summary.username, "foodbank");
        assert_eq!(summary.name.as_deref(), Some("Downtown Food Bank"));
    }
}
