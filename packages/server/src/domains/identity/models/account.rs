//! SQL persistence for actors.
//!
//! One `users` row per account plus exactly one profile row in either
//! `organizations` or `samaritans`, keyed by the user id.

use anyhow::{anyhow, Context};
use sqlx::PgPool;

use super::actor::{
    Actor, Identity, OrganizationProfile, PostalAddress, Role, RoleKind, SamaritanProfile,
};
use crate::common::{AppResult, GeoPoint, UserId};

const SELECT_ACTORS: &str = "
    SELECT u.id, u.username, u.email, u.role,
           o.name AS org_name, o.latitude AS org_latitude, o.longitude AS org_longitude,
           o.address_line1, o.address_line2,
           o.city AS org_city, o.province AS org_province, o.postal_code,
           s.rating, s.city AS sam_city, s.province AS sam_province
    FROM users u
    LEFT JOIN organizations o ON o.user_id = u.id
    LEFT JOIN samaritans s ON s.user_id = u.id";

#[derive(sqlx::FromRow, Debug, Clone)]
struct ActorRow {
    id: UserId,
    username: String,
    email: String,
    role: String,

    org_name: Option<String>,
    org_latitude: Option<f64>,
    org_longitude: Option<f64>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    org_city: Option<String>,
    org_province: Option<String>,
    postal_code: Option<String>,

    rating: Option<f64>,
    sam_city: Option<String>,
    sam_province: Option<String>,
}

impl TryFrom<ActorRow> for Actor {
    type Error = anyhow::Error;

    fn try_from(row: ActorRow) -> anyhow::Result<Self> {
        let kind: RoleKind = row.role.parse()?;
        let missing = |field: &str| anyhow!("user {} is missing profile field {}", row.id, field);

        let role = match kind {
            RoleKind::Organization => Role::Organization(OrganizationProfile {
                name: row.org_name.clone().ok_or_else(|| missing("name"))?,
                location: GeoPoint::new(
                    row.org_latitude.ok_or_else(|| missing("latitude"))?,
                    row.org_longitude.ok_or_else(|| missing("longitude"))?,
                ),
                address: PostalAddress {
                    line1: row.address_line1.clone().unwrap_or_default(),
                    line2: row.address_line2.clone(),
                    city: row.org_city.clone().unwrap_or_default(),
                    province: row.org_province.clone().unwrap_or_default(),
                    postal_code: row.postal_code.clone().unwrap_or_default(),
                },
            }),
            RoleKind::Samaritan => Role::Samaritan(SamaritanProfile {
                city: row.sam_city.clone().unwrap_or_default(),
                province: row.sam_province.clone().unwrap_or_default(),
                rating: row.rating.unwrap_or(0.0),
            }),
        };

        Ok(Actor {
            identity: Identity {
                id: row.id,
                username: row.username,
                email: row.email,
            },
            role,
        })
    }
}

impl Actor {
    /// Find actor by ID
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> AppResult<Option<Self>> {
        let row = sqlx::query_as::<_, ActorRow>(&format!("{SELECT_ACTORS} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row
            .map(Actor::try_from)
            .transpose()
            .context("failed to load actor")?)
    }

    /// Load several actors at once. Unknown ids are skipped.
    pub async fn find_by_ids(ids: &[UserId], pool: &PgPool) -> AppResult<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows =
            sqlx::query_as::<_, ActorRow>(&format!("{SELECT_ACTORS} WHERE u.id = ANY($1)"))
                .bind(ids)
                .fetch_all(pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(Actor::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    pub async fn email_exists(email: &str, pool: &PgPool) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn username_exists(username: &str, pool: &PgPool) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Insert the account and its profile in one transaction.
    pub async fn insert(&self, pool: &PgPool) -> AppResult<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO users (id, username, email, role) VALUES ($1, $2, $3, $4)")
            .bind(self.identity.id)
            .bind(&self.identity.username)
            .bind(&self.identity.email)
            .bind(self.kind().as_str())
            .execute(&mut *tx)
            .await?;

        match &self.role {
            Role::Organization(org) => {
                sqlx::query(
                    "INSERT INTO organizations (
                        user_id, name, latitude, longitude,
                        address_line1, address_line2, city, province, postal_code
                     )
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(self.identity.id)
                .bind(&org.name)
                .bind(org.location.latitude)
                .bind(org.location.longitude)
                .bind(&org.address.line1)
                .bind(&org.address.line2)
                .bind(&org.address.city)
                .bind(&org.address.province)
                .bind(&org.address.postal_code)
                .execute(&mut *tx)
                .await?;
            }
            Role::Samaritan(samaritan) => {
                sqlx::query(
                    "INSERT INTO samaritans (user_id, rating, city, province)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(self.identity.id)
                .bind(samaritan.rating)
                .bind(&samaritan.city)
                .bind(&samaritan.province)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
