//! Coffee-shop API server.
//!
//! This is the main entry point for the drinks API.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to use a mock token verifier that doesn't
//! contact the identity provider.
//! Use tokens in format: `test-token:<subject>:<permission,permission>`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(not(feature = "dev-mode"))]
use coffee_shop_auth::JwksTokenVerifier;
#[cfg(feature = "dev-mode")]
use coffee_shop_auth::MockTokenVerifier;
use coffee_shop_api::{create_router, AppState, Settings};
use coffee_shop_store::{sample_drink, RocksStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coffee_shop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting coffee-shop API");

    let Settings { api, auth } = Settings::from_env()?;

    tracing::info!(
        listen_addr = %api.listen_addr,
        data_dir = %api.data_dir,
        jwks_url = %auth.jwks_url(),
        issuer = %auth.issuer(),
        audience = %auth.audience,
        algorithm = ?auth.algorithm,
        "Configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %api.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&api.data_dir)?);

    if api.seed_drinks && store.is_empty()? {
        let drink = store.insert_drink(sample_drink())?;
        tracing::info!(drink_id = %drink.id, title = %drink.title, "Seeded sample drink");
    }

    // Initialize token verifier
    #[cfg(feature = "dev-mode")]
    let verifier = {
        tracing::warn!("DEV MODE ENABLED - using mock token verifier");
        tracing::warn!("Use tokens in format: test-token:<subject>:<permission,permission>");
        Arc::new(MockTokenVerifier)
    };

    #[cfg(not(feature = "dev-mode"))]
    let verifier = {
        let verifier = Arc::new(JwksTokenVerifier::new(auth)?);
        match verifier.keys().refresh().await {
            Ok(keys) => tracing::info!(keys = keys.len(), "Key set loaded"),
            Err(err) => tracing::warn!(
                error = %err,
                "Could not load key set at startup, will retry on first request"
            ),
        }
        verifier
    };

    let listen_addr = api.listen_addr.clone();
    let state = AppState::new(store, verifier, api);
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
