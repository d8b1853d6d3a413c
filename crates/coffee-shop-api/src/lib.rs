//! HTTP API for the coffee-shop drink menu.
//!
//! Public clients can read the menu; baristas and managers holding tokens from
//! the identity provider can see recipes and edit the menu. Every protected
//! route is guarded by exactly one permission.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │                 Clients                    │
//! └────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌────────────────────────────────────────────┐
//! │              coffee-shop-api               │
//! │  ┌──────────────────┐ ┌─────────────────┐  │
//! │  │ route_layer      │ │ Router          │  │
//! │  │ (AuthMiddleware) │ │ + Handlers      │  │
//! │  └──────────────────┘ └─────────────────┘  │
//! └────────────────────────────────────────────┘
//!             │                     │
//!             ▼                     ▼
//!      ┌──────────────┐     ┌──────────────┐
//!      │ Auth (JWKS)  │     │ Store        │
//!      └──────────────┘     └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coffee_shop_api::{create_router, ApiConfig, AppState};
//! use coffee_shop_auth::{AuthConfig, JwksTokenVerifier};
//! use coffee_shop_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/coffee-shop")?);
//! let verifier = Arc::new(JwksTokenVerifier::new(AuthConfig::new(
//!     "tenant.eu.auth0.com",
//!     "coffee-shop",
//! ))?);
//!
//! let state = AppState::new(store, verifier, ApiConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError, Settings};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
