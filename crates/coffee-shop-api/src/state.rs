//! Shared application state available to all request handlers.

use std::sync::Arc;

use coffee_shop_auth::TokenVerifier;
use coffee_shop_store::Store;

use crate::config::ApiConfig;

/// Shared application state for the API.
pub struct AppState<S, V>
where
    S: Store,
    V: TokenVerifier,
{
    /// Drink storage.
    pub store: Arc<S>,
    /// Verifier shared by every protected route.
    pub verifier: Arc<V>,
    /// Server configuration.
    pub config: ApiConfig,
}

impl<S, V> AppState<S, V>
where
    S: Store,
    V: TokenVerifier,
{
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<S>, verifier: Arc<V>, config: ApiConfig) -> Self {
        Self {
            store,
            verifier,
            config,
        }
    }
}

impl<S, V> Clone for AppState<S, V>
where
    S: Store,
    V: TokenVerifier,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            verifier: Arc::clone(&self.verifier),
            config: self.config.clone(),
        }
    }
}
