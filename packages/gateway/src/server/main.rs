// Main entry point for the gateway server

use std::sync::Arc;

use anyhow::{Context, Result};
use gateway_core::kernel::{LogMailer, MemoryStore, PostgresStore, ServerDeps};
use gateway_core::{server::build_app, Config, Settings};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gateway_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting resource gateway");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "Configuration loaded");

    let deps = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            let store = PostgresStore::new(pool);
            tracing::info!("Running database migrations...");
            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            ServerDeps::new(Arc::new(store), Arc::new(LogMailer))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            ServerDeps::new(Arc::new(MemoryStore::new()), Arc::new(LogMailer))
        }
    };

    if config.debug_mode {
        tracing::warn!("DEBUG_MODE enabled: error bodies include underlying detail");
    }

    // Build application
    let settings = Settings::from(&config);
    let app = build_app(deps, settings, config.allowed_origins.clone());

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
