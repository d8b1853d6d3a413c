//! JWT validation and claims extraction.
//!
//! This module provides the core JWT validation logic: header screening,
//! key resolution, signature verification and claims validation.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, get_current_timestamp, Algorithm, Validation};
use serde::Deserialize;

use crate::error::{AuthError, AuthSetupError, Result};
use crate::jwks::KeySetCache;
use crate::token::BearerToken;
use crate::AuthConfig;

/// Claims from a token that passed every check.
///
/// Only a [`TokenVerifier`] can build this value, so holding one proves the
/// token was verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClaims {
    subject: String,
    issuer: String,
    audience: Vec<String>,
    expires_at: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
    permissions: BTreeSet<String>,
}

impl ValidatedClaims {
    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The `aud` claim, normalized to a list.
    #[must_use]
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// When the token expires.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// When the token was issued, if it says.
    #[must_use]
    pub const fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    /// The granted permissions. Empty when the token has no
    /// `permissions` claim.
    #[must_use]
    pub const fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Exact-match permission test.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Trait for verifying bearer tokens.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a token and extract its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, unverifiable, expired,
    /// issued for another audience or issuer, or the key set is unavailable.
    async fn verify(&self, token: &BearerToken) -> Result<ValidatedClaims>;
}

/// The unverified JOSE header fields we route on.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: Option<String>,
    kid: Option<String>,
    #[serde(skip)]
    signed: bool,
}

impl TokenHeader {
    /// Split the token and decode its header without touching the signature.
    fn peek(token: &str) -> Result<Self> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(AuthError::MalformedToken("empty segment".to_string()));
        }

        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;

        let mut parsed: Self = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("header is not JSON: {e}")))?;
        parsed.signed = !signature.is_empty();
        Ok(parsed)
    }
}

/// Raw claims from a JWT before validation.
#[derive(Debug, Deserialize)]
struct RawClaims {
    /// Subject
    sub: String,
    /// Issuer (validated by jsonwebtoken)
    #[serde(default)]
    iss: Option<String>,
    /// Audience (can be string or array)
    #[serde(default)]
    aud: Audience,
    /// Expiration timestamp (validated by jsonwebtoken)
    exp: u64,
    /// Issued at timestamp
    #[serde(default)]
    iat: Option<u64>,
    /// Granted permissions
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

/// Audience claim that can be either a string or array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum Audience {
    Single(String),
    Multiple(Vec<String>),
    #[default]
    None,
}

impl Audience {
    fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(v) => v.iter().any(|s| s == value),
            Self::None => false,
        }
    }

    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Multiple(v) => v,
            Self::None => Vec::new(),
        }
    }
}

fn timestamp(secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| AuthError::MalformedToken("timestamp out of range".to_string()))
}

/// JWKS-based token verifier.
///
/// Fetches public keys from the identity provider's JWKS endpoint and accepts
/// only the single configured algorithm.
pub struct JwksTokenVerifier {
    config: AuthConfig,
    issuer: String,
    keys: KeySetCache,
}

impl JwksTokenVerifier {
    /// Create a new JWKS-based verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured algorithm is symmetric or the HTTP
    /// client cannot be built.
    pub fn new(config: AuthConfig) -> std::result::Result<Self, AuthSetupError> {
        config.validate()?;
        let keys = KeySetCache::new(&config)?;
        let issuer = config.issuer();
        Ok(Self {
            config,
            issuer,
            keys,
        })
    }

    /// Get a reference to the key cache for manual operations.
    #[must_use]
    pub const fn keys(&self) -> &KeySetCache {
        &self.keys
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = self.config.clock_skew_seconds;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        // Audience is checked manually since it can be string or array
        validation.validate_aud = false;
        validation.validate_exp = true;
        validation
    }
}

#[async_trait]
impl TokenVerifier for JwksTokenVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<ValidatedClaims> {
        let raw = token.as_str();
        if raw.is_empty() {
            return Err(AuthError::MalformedToken("empty token".to_string()));
        }

        // Screen the header before any network call
        let header = TokenHeader::peek(raw)?;
        let alg = header
            .alg
            .ok_or_else(|| AuthError::MalformedToken("header has no alg".to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::MalformedToken("header has no kid".to_string()))?;

        let allowed = self.config.algorithm;
        if Algorithm::from_str(&alg).ok() != Some(allowed) {
            return Err(AuthError::UnsupportedAlgorithm(alg));
        }
        // Unsigned `alg: none` tokens are reported above, by algorithm
        if !header.signed {
            return Err(AuthError::MalformedToken("empty signature".to_string()));
        }

        let key = self.keys.get_key(&kid).await?;
        if key.algorithm().is_some_and(|key_alg| key_alg != allowed) {
            tracing::debug!(kid = %kid, "Key is pinned to a different algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let token_data = decode::<RawClaims>(raw, key.decoding_key(), &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidIssuer => AuthError::WrongIssuer,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::WrongIssuer,
                // Signature mismatch, or a key whose family cannot verify `alg`
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken(e.to_string()),
            })?;

        let claims = token_data.claims;

        // jsonwebtoken accepts `exp == now`; expiry must be in the future
        if claims.exp.saturating_add(self.config.clock_skew_seconds) <= get_current_timestamp() {
            return Err(AuthError::Expired);
        }

        // Validate audience manually
        if !claims.aud.contains(&self.config.audience) {
            return Err(AuthError::WrongAudience);
        }

        Ok(ValidatedClaims {
            subject: claims.sub,
            issuer: claims.iss.unwrap_or_else(|| self.issuer.clone()),
            audience: claims.aud.into_vec(),
            expires_at: timestamp(claims.exp)?,
            issued_at: claims.iat.map(timestamp).transpose()?,
            permissions: claims.permissions.unwrap_or_default().into_iter().collect(),
        })
    }
}

/// A mock token verifier for testing.
///
/// This verifier accepts any token in the format
/// `test-token:<subject>:<permission>,<permission>,...` and grants the listed
/// permissions. The permission list may be empty.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockTokenVerifier;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<ValidatedClaims> {
        let expected =
            || AuthError::MalformedToken("expected test-token:<subject>:<permissions>".to_string());

        let rest = token.as_str().strip_prefix("test-token:").ok_or_else(expected)?;
        let (subject, permissions) = rest.split_once(':').ok_or_else(expected)?;
        if subject.is_empty() {
            return Err(expected());
        }

        Ok(ValidatedClaims {
            subject: subject.to_string(),
            issuer: "mock".to_string(),
            audience: vec!["mock".to_string()],
            expires_at: Utc::now() + chrono::Duration::hours(1),
            issued_at: None,
            permissions: permissions
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

#[cfg(test)]
pub(crate) fn claims_with_permissions(permissions: &[&str]) -> ValidatedClaims {
    ValidatedClaims {
        subject: "auth0|tester".to_string(),
        issuer: "https://tenant.auth0.com/".to_string(),
        audience: vec!["coffee-shop".to_string()],
        expires_at: Utc::now() + chrono::Duration::hours(1),
        issued_at: None,
        permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_segment(json: &str) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(json)
    }

    fn verifier() -> JwksTokenVerifier {
        // Unroutable provider: any test reaching the network fails loudly.
        let mut config = AuthConfig::new("http://127.0.0.1:9", "coffee-shop");
        config.jwks_timeout_seconds = 1;
        JwksTokenVerifier::new(config).unwrap()
    }

    #[test]
    fn peek_reads_header() {
        let token = format!(
            "{}.{}.sig",
            encode_segment(r#"{"alg":"RS256","kid":"k1","typ":"JWT"}"#),
            encode_segment("{}")
        );
        let header = TokenHeader::peek(&token).unwrap();
        assert_eq!(header.alg.as_deref(), Some("RS256"));
        assert_eq!(header.kid.as_deref(), Some("k1"));
    }

    #[test]
    fn peek_rejects_wrong_segment_count() {
        for token in ["abc", "a.b", "a.b.c.d", ".b.c", "a..c"] {
            assert!(
                matches!(TokenHeader::peek(token), Err(AuthError::MalformedToken(_))),
                "token {token}"
            );
        }
    }

    #[test]
    fn peek_rejects_non_json_header() {
        let token = format!("{}.e30.sig", encode_segment("not json"));
        assert!(matches!(
            TokenHeader::peek(&token),
            Err(AuthError::MalformedToken(_))
        ));
        assert!(matches!(
            TokenHeader::peek("!!!.e30.sig"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[tokio::test]
    async fn empty_token_is_malformed() {
        let err = verifier().verify(&BearerToken::new("")).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[tokio::test]
    async fn header_without_kid_is_malformed_without_fetch() {
        let v = verifier();
        let token = format!("{}.e30.sig", encode_segment(r#"{"alg":"RS256"}"#));
        let err = v.verify(&BearerToken::new(token)).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
        assert_eq!(v.keys().fetch_count(), 0);
    }

    #[tokio::test]
    async fn unsigned_token_is_unsupported_algorithm() {
        let v = verifier();
        let token = format!("{}.e30.", encode_segment(r#"{"alg":"none","kid":"k1"}"#));
        let err = v.verify(&BearerToken::new(token)).await.unwrap_err();
        assert_eq!(err, AuthError::UnsupportedAlgorithm("none".to_string()));
        assert_eq!(v.keys().fetch_count(), 0);
    }

    #[tokio::test]
    async fn mock_verifier_grants_listed_permissions() {
        let claims = MockTokenVerifier
            .verify(&BearerToken::new("test-token:barista:get:drinks-detail,post:drinks"))
            .await
            .unwrap();
        assert_eq!(claims.subject(), "barista");
        assert!(claims.has_permission("get:drinks-detail"));
        assert!(claims.has_permission("post:drinks"));
        assert!(!claims.has_permission("delete:drinks"));
    }

    #[tokio::test]
    async fn mock_verifier_rejects_other_tokens() {
        let result = MockTokenVerifier
            .verify(&BearerToken::new("invalid-token"))
            .await;
        assert!(result.is_err());

        let result = MockTokenVerifier
            .verify(&BearerToken::new("test-token::"))
            .await;
        assert!(result.is_err());
    }
}
