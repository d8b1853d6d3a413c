//! Bearer token verification and authorization for coffee-shop.
//!
//! This crate verifies tokens issued by an external identity provider and
//! enforces per-route permissions:
//!
//! - JWKS (JSON Web Key Set) fetching and caching
//! - Signature validation with a single allow-listed asymmetric algorithm
//! - Expiry, audience and issuer checks
//! - Exact-match permission checks
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   HTTP route     │────▶│  AuthMiddleware  │──── RequiredPermission
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  TokenVerifier   │
//!                          │  (trait)         │
//!                          └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  KeySetCache     │
//!                          └────────┬─────────┘
//!                                   │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │  Identity        │
//!                          │  provider JWKS   │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coffee_shop_auth::{AuthConfig, AuthMiddleware, JwksTokenVerifier, RequiredPermission};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new("tenant.eu.auth0.com", "coffee-shop");
//! let verifier = Arc::new(JwksTokenVerifier::new(config)?);
//! let guard = AuthMiddleware::new(verifier, RequiredPermission::new("get:drinks-detail"));
//!
//! // In a request handler:
//! let header = Some("Bearer eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...");
//! let claims = guard.authorize(header).await?;
//! println!("Subject: {}", claims.subject());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod permission;
pub mod token;

use std::time::Duration;

use serde::Deserialize;

pub use error::{AuthError, AuthSetupError, FailureKind, Result};
pub use jwks::{KeySet, KeySetCache, SigningKey};
pub use jwt::{JwksTokenVerifier, TokenVerifier, ValidatedClaims};
pub use middleware::AuthMiddleware;
pub use permission::{check_permission, RequiredPermission};
pub use token::BearerToken;

pub use jsonwebtoken::Algorithm;

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::MockTokenVerifier;

/// Configuration for verifying tokens from the identity provider.
///
/// Loaded once at process start.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Identity provider domain, either a bare host (`tenant.auth0.com`,
    /// HTTPS implied) or a full base URL.
    pub domain: String,

    /// Path of the JWKS document under the domain.
    #[serde(default = "AuthConfig::default_jwks_path")]
    pub jwks_path: String,

    /// Expected `aud` claim.
    pub audience: String,

    /// Expected `iss` claim. Defaults to the base URL with a trailing slash.
    #[serde(default)]
    pub issuer: Option<String>,

    /// The single accepted signing algorithm.
    #[serde(default = "AuthConfig::default_algorithm")]
    pub algorithm: Algorithm,

    /// Leeway applied to the `exp` check, in seconds.
    #[serde(default)]
    pub clock_skew_seconds: u64,

    /// Force a key set refresh once it is this old, even on cache hits.
    #[serde(default)]
    pub jwks_ttl_seconds: Option<u64>,

    /// Timeout for a single key set fetch, in seconds.
    #[serde(default = "AuthConfig::default_jwks_timeout")]
    pub jwks_timeout_seconds: u64,
}

impl AuthConfig {
    /// Create a configuration with default settings for everything except
    /// the provider domain and audience.
    #[must_use]
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            jwks_path: Self::default_jwks_path(),
            audience: audience.into(),
            issuer: None,
            algorithm: Self::default_algorithm(),
            clock_skew_seconds: 0,
            jwks_ttl_seconds: None,
            jwks_timeout_seconds: Self::default_jwks_timeout(),
        }
    }

    fn default_jwks_path() -> String {
        "/.well-known/jwks.json".to_string()
    }

    const fn default_algorithm() -> Algorithm {
        Algorithm::RS256
    }

    const fn default_jwks_timeout() -> u64 {
        10
    }

    /// Base URL of the identity provider, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.contains("://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Get the JWKS endpoint URL.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        let path = self.jwks_path.trim_start_matches('/');
        format!("{}/{path}", self.base_url())
    }

    /// Get the expected JWT issuer.
    #[must_use]
    pub fn issuer(&self) -> String {
        self.issuer
            .clone()
            .unwrap_or_else(|| format!("{}/", self.base_url()))
    }

    /// Get the clock skew tolerance as a `Duration`.
    #[must_use]
    pub const fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_seconds)
    }

    /// Get the key set TTL, if any.
    #[must_use]
    pub fn jwks_ttl(&self) -> Option<Duration> {
        self.jwks_ttl_seconds.map(Duration::from_secs)
    }

    /// Get the key fetch timeout as a `Duration`.
    #[must_use]
    pub const fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_seconds)
    }

    /// Reject configurations that would allow-list a symmetric algorithm.
    ///
    /// # Errors
    ///
    /// Returns `AuthSetupError::DisallowedAlgorithm` for the HMAC family.
    pub fn validate(&self) -> std::result::Result<(), AuthSetupError> {
        match self.algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                Err(AuthSetupError::DisallowedAlgorithm(self.algorithm))
            }
            _ => Ok(()),
        }
    }
}
