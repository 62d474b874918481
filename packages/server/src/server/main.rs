// Main entry point for the donation matching server

use std::sync::Arc;

use anyhow::{Context, Result};
use samaritan_core::domains::auth::JwtService;
use samaritan_core::domains::items::rearm_pending_expiries;
use samaritan_core::kernel::{
    start_scheduler, BaseExpiryScheduler, BaseItemStore, LocalImageStore, PostgresIdentityStore,
    PostgresItemStore, ServerDeps, TokioExpiryScheduler,
};
use samaritan_core::server::{build_app, AppState};
use samaritan_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,samaritan_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting donation matching server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let item_store = Arc::new(PostgresItemStore::new(pool.clone()));
    let items: Arc<dyn BaseItemStore> = item_store.clone();
    let expiry: Arc<dyn BaseExpiryScheduler> =
        Arc::new(TokioExpiryScheduler::new(items.clone()));

    // Timers do not survive a restart
    let rearmed = rearm_pending_expiries(items.as_ref(), expiry.as_ref())
        .await
        .context("Failed to re-arm expiry timers")?;
    tracing::info!(rearmed, "Expiry timers re-armed");

    let _scheduler = start_scheduler(items.clone(), &config.expiry_sweep_cron)
        .await
        .context("Failed to start scheduler")?;

    let deps = ServerDeps::new(
        items,
        item_store,
        Arc::new(PostgresIdentityStore::new(pool.clone())),
        Arc::new(LocalImageStore::new(&config.image_dir)),
        expiry,
        config.item_settings(),
    );
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let state = AppState::new(Arc::new(deps), Some(pool), jwt_service);

    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
