use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::kernel::ItemSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Browse radius when the request does not give one (km)
    pub default_radius_km: f64,
    pub items_per_page: usize,
    pub history_items_per_page: usize,
    pub item_lifetime_days: i64,
    pub image_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    /// Six-field cron expression for the overdue-expiry sweep
    pub expiry_sweep_cron: String,
}

fn parsed<T: std::str::FromStr>(name: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid number", name))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parsed("PORT", "8080")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "samaritan".to_string()),
            default_radius_km: parsed("DEFAULT_RADIUS", "5")?,
            items_per_page: parsed("ITEMS_PER_PAGE", "25")?,
            history_items_per_page: parsed("HISTORY_ITEMS_PER_PAGE", "10")?,
            item_lifetime_days: parsed("ITEM_LIFETIME_DAYS", "14")?,
            image_dir: env::var("IMAGE_DIR")
                .unwrap_or_else(|_| "./media/item_images".to_string())
                .into(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            expiry_sweep_cron: env::var("EXPIRY_SWEEP_CRON")
                .unwrap_or_else(|_| "0 * * * * *".to_string()),
        };

        anyhow::ensure!(
            config.default_radius_km > 0.0,
            "DEFAULT_RADIUS must be positive"
        );
        anyhow::ensure!(config.items_per_page > 0, "ITEMS_PER_PAGE must be positive");
        anyhow::ensure!(
            config.history_items_per_page > 0,
            "HISTORY_ITEMS_PER_PAGE must be positive"
        );
        anyhow::ensure!(
            config.item_lifetime_days > 0,
            "ITEM_LIFETIME_DAYS must be positive"
        );

        Ok(config)
    }

    pub fn item_settings(&self) -> ItemSettings {
        ItemSettings {
            default_radius_km: self.default_radius_km,
            items_per_page: self.items_per_page,
            history_items_per_page: self.history_items_per_page,
            item_lifetime: chrono::Duration::days(self.item_lifetime_days),
        }
    }
}
