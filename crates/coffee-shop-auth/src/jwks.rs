//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The cache replaces the whole key set on every fetch; a miss or an expired
//! TTL triggers a refetch.
//!
//! # Refresh policy
//!
//! At most one fetch is in flight. A caller that needs a refresh while one is
//! running waits for it and then uses its outcome: the new set, or the same
//! failure. Callers that hit a usable set never wait. The set is swapped in
//! behind an `Arc`, so readers see either the old set or the new one.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AuthError, AuthSetupError, Result};
use crate::AuthConfig;

/// JWKS response from the identity provider.
#[derive(Debug, Deserialize)]
pub struct JwksResponse {
    /// The list of keys.
    pub keys: Vec<JwkKey>,
}

/// A single JWK (JSON Web Key).
#[derive(Debug, Deserialize)]
pub struct JwkKey {
    /// Key type ("RSA", "EC" or "OKP").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// Key use (e.g., "sig").
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// Algorithm (e.g., "RS256").
    pub alg: Option<String>,
    /// RSA modulus (base64url).
    pub n: Option<String>,
    /// RSA exponent (base64url).
    pub e: Option<String>,
    /// Curve for EC and OKP keys.
    pub crv: Option<String>,
    /// EC x coordinate or OKP public key (base64url).
    pub x: Option<String>,
    /// EC y coordinate (base64url).
    pub y: Option<String>,
}

/// A public key that can verify token signatures.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    algorithm: Option<Algorithm>,
    key: DecodingKey,
}

impl SigningKey {
    /// The key ID.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The algorithm the provider pinned this key to, if any.
    #[must_use]
    pub const fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// The key in the form `jsonwebtoken` verifies with.
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Parse a JWK into a signing key.
    ///
    /// Returns `None` for keys that are not usable for signature checks:
    /// no `kid`, encryption keys, unknown key types, or bad components.
    fn from_jwk(jwk: &JwkKey) -> Option<Self> {
        let Some(kid) = jwk.kid.clone() else {
            tracing::warn!(kty = %jwk.kty, "Skipping JWK without kid");
            return None;
        };

        if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
            tracing::debug!(kid = %kid, "Skipping non-signing JWK");
            return None;
        }

        let algorithm = match jwk.alg.as_deref().map(Algorithm::from_str) {
            None => None,
            Some(Ok(alg)) => Some(alg),
            Some(Err(_)) => {
                tracing::warn!(kid = %kid, alg = ?jwk.alg, "Skipping JWK with unknown alg");
                return None;
            }
        };

        let parsed = match (jwk.kty.as_str(), jwk.crv.as_deref()) {
            ("RSA", _) => match (&jwk.n, &jwk.e) {
                (Some(n), Some(e)) => DecodingKey::from_rsa_components(n, e),
                _ => {
                    tracing::warn!(kid = %kid, "Skipping RSA JWK without n/e");
                    return None;
                }
            },
            ("EC", _) => match (&jwk.x, &jwk.y) {
                (Some(x), Some(y)) => DecodingKey::from_ec_components(x, y),
                _ => {
                    tracing::warn!(kid = %kid, "Skipping EC JWK without x/y");
                    return None;
                }
            },
            ("OKP", Some("Ed25519")) => match &jwk.x {
                Some(x) => DecodingKey::from_ed_components(x),
                None => {
                    tracing::warn!(kid = %kid, "Skipping OKP JWK without x");
                    return None;
                }
            },
            (kty, crv) => {
                tracing::warn!(kid = %kid, kty = kty, crv = ?crv, "Unsupported key type");
                return None;
            }
        };

        match parsed {
            Ok(key) => Some(Self {
                kid,
                algorithm,
                key,
            }),
            Err(e) => {
                tracing::warn!(kid = %kid, error = %e, "Skipping JWK with invalid components");
                None
            }
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// One fetched key set, in provider order.
#[derive(Debug)]
pub struct KeySet {
    keys: Vec<SigningKey>,
    index: HashMap<String, usize>,
    fetched_at: Instant,
}

impl KeySet {
    /// Build a key set from a JWKS document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyProviderUnavailable` if two usable keys share a
    /// key ID.
    pub fn from_jwks(response: &JwksResponse) -> Result<Self> {
        let mut keys = Vec::with_capacity(response.keys.len());
        let mut index = HashMap::with_capacity(response.keys.len());

        for key in response.keys.iter().filter_map(SigningKey::from_jwk) {
            if index.contains_key(&key.kid) {
                return Err(AuthError::KeyProviderUnavailable(format!(
                    "key set contains duplicate key ID {}",
                    key.kid
                )));
            }
            index.insert(key.kid.clone(), keys.len());
            keys.push(key);
        }

        Ok(Self {
            keys,
            index,
            fetched_at: Instant::now(),
        })
    }

    /// Look up a key by ID.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.index.get(kid).map(|&i| &self.keys[i])
    }

    /// Keys in the order the provider published them.
    pub fn iter(&self) -> impl Iterator<Item = &SigningKey> {
        self.keys.iter()
    }

    /// Number of usable keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the provider published no usable keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time since this set was fetched.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// Caches the identity provider's signing keys.
pub struct KeySetCache {
    jwks_url: String,
    ttl: Option<Duration>,
    timeout: Duration,
    client: reqwest::Client,
    current: RwLock<Option<Arc<KeySet>>>,
    /// Completed fetch attempts, successful or not.
    attempts: AtomicU64,
    /// Single-flight lock; holds the failure of the last attempt.
    refresh: Mutex<Option<AuthError>>,
}

impl KeySetCache {
    /// Create an empty cache. Nothing is fetched until the first lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &AuthConfig) -> std::result::Result<Self, AuthSetupError> {
        let client = reqwest::Client::builder()
            .timeout(config.jwks_timeout())
            .build()
            .map_err(|e| AuthSetupError::HttpClient(e.to_string()))?;

        Ok(Self {
            jwks_url: config.jwks_url(),
            ttl: config.jwks_ttl(),
            timeout: config.jwks_timeout(),
            client,
            current: RwLock::new(None),
            attempts: AtomicU64::new(0),
            refresh: Mutex::new(None),
        })
    }

    /// Get a signing key by key ID, fetching the key set if necessary.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownKey` if the freshly fetched set does not
    /// contain `kid`, or `AuthError::KeyProviderUnavailable` if the fetch
    /// fails or times out.
    pub async fn get_key(&self, kid: &str) -> Result<SigningKey> {
        let seen = self.attempts.load(Ordering::Acquire);

        // Check cache first
        if let Some(set) = self.current() {
            if self.is_fresh(&set) {
                if let Some(key) = set.get(kid) {
                    return Ok(key.clone());
                }
                tracing::debug!(kid = %kid, "Key ID not in cached set");
            } else {
                tracing::debug!(age_secs = set.age().as_secs(), "Key set past TTL");
            }
        }

        let mut last_failure = self.refresh.lock().await;

        // Another caller fetched while we waited; take its outcome.
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
            if let Some(set) = self.current() {
                return Self::lookup(&set, kid);
            }
        }

        let set = self.fetch_locked(&mut last_failure).await?;
        Self::lookup(&set, kid)
    }

    /// Fetch the key set now, regardless of cache state.
    ///
    /// Useful at startup to warm the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWKS fetch fails.
    pub async fn refresh(&self) -> Result<Arc<KeySet>> {
        let mut last_failure = self.refresh.lock().await;
        self.fetch_locked(&mut last_failure).await
    }

    /// The currently cached set, if one has been fetched.
    #[must_use]
    pub fn current(&self) -> Option<Arc<KeySet>> {
        self.current.read().clone()
    }

    /// Number of completed fetch attempts.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    fn is_fresh(&self, set: &KeySet) -> bool {
        self.ttl.map_or(true, |ttl| set.age() < ttl)
    }

    fn lookup(set: &KeySet, kid: &str) -> Result<SigningKey> {
        set.get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    /// Fetch and install a new set. Caller holds the `refresh` lock.
    async fn fetch_locked(&self, last_failure: &mut Option<AuthError>) -> Result<Arc<KeySet>> {
        // The outcome is stored before `attempts` moves, so a caller that
        // observes the new count also observes the new set or failure.
        let result = match self.fetch().await {
            Ok(set) => {
                let set = Arc::new(set);
                *self.current.write() = Some(Arc::clone(&set));
                *last_failure = None;
                tracing::debug!(count = set.len(), "Cached JWKS keys");
                Ok(set)
            }
            Err(err) => {
                tracing::warn!(url = %self.jwks_url, error = %err, "JWKS fetch failed");
                *last_failure = Some(err.clone());
                Err(err)
            }
        };
        self.attempts.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn fetch(&self) -> Result<KeySet> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response: JwksResponse = self
            .client
            .get(&self.jwks_url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?
            .json()
            .await
            .map_err(fetch_error)?;

        KeySet::from_jwks(&response)
    }
}

fn fetch_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::KeyProviderUnavailable("timed out fetching key set".to_string())
    } else {
        AuthError::KeyProviderUnavailable(err.to_string())
    }
}
