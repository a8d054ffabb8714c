use delivery_hub::{
    api::{self, state::AppState},
    config::{self, AppConfig, database},
    core::{api_key, gas_product},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load settings
    let app_config = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(bind_address = %app_config.bind_address, "Configuration loaded");

    // 4. Connect and make sure the schema exists
    let db = database::connect(&app_config)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the product catalog
    if app_config.catalog_path.exists() {
        let catalog = config::load_catalog(&app_config.catalog_path)?;
        let inserted = gas_product::seed_gas_products(&db, &catalog).await?;
        info!(inserted, "Product catalog seeded");
    } else {
        warn!(path = %app_config.catalog_path.display(), "No product catalog found, skipping seed");
    }

    // 6. Install the first API key on an empty database
    if let Some(secret) = app_config.bootstrap_api_key.as_deref()
        && let Some(key) = api_key::bootstrap_api_key(&db, secret).await?
    {
        info!(key_prefix = %key.key_prefix, "Bootstrap API key installed");
    }

    // 7. Serve
    let listener = TcpListener::bind(app_config.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", app_config.bind_address, e))?;
    info!("Listening on {}", app_config.bind_address);

    let app = api::router(Arc::new(AppState::new(db)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
