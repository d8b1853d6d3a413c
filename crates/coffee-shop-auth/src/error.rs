//! Authorization failure types.

use std::fmt;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Reasons a request can fail authorization.
///
/// Each variant is created where the problem is detected and reaches the
/// middleware boundary unchanged. Messages never contain key material or the
/// token itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or it is not a `Bearer` credential.
    #[error("missing bearer token")]
    MissingToken,

    /// The token is not a well-formed JWS compact serialization.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token declares an algorithm other than the allow-listed one.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No key in the current key set carries the token's key ID.
    #[error("no signing key for key ID {0}")]
    UnknownKey(String),

    /// The signature does not verify against the resolved key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// The `aud` claim does not contain the expected audience.
    #[error("invalid audience")]
    WrongAudience,

    /// The `iss` claim does not match the expected issuer.
    #[error("invalid issuer")]
    WrongIssuer,

    /// The token is valid but lacks the required permission.
    #[error("missing required permission: {0}")]
    InsufficientScope(String),

    /// The key set could not be fetched.
    #[error("key provider unavailable: {0}")]
    KeyProviderUnavailable(String),
}

/// Stable, coarse classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`AuthError::MissingToken`].
    MissingToken,
    /// See [`AuthError::MalformedToken`].
    MalformedToken,
    /// See [`AuthError::UnsupportedAlgorithm`].
    UnsupportedAlgorithm,
    /// Unknown key or signature mismatch.
    UnverifiableSignature,
    /// See [`AuthError::Expired`].
    Expired,
    /// See [`AuthError::WrongAudience`].
    WrongAudience,
    /// See [`AuthError::WrongIssuer`].
    WrongIssuer,
    /// See [`AuthError::InsufficientScope`].
    InsufficientScope,
    /// See [`AuthError::KeyProviderUnavailable`].
    KeyProviderUnavailable,
}

impl FailureKind {
    /// Machine-readable code used in API error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::UnverifiableSignature => "unverifiable_signature",
            Self::Expired => "token_expired",
            Self::WrongAudience => "wrong_audience",
            Self::WrongIssuer => "wrong_issuer",
            Self::InsufficientScope => "insufficient_scope",
            Self::KeyProviderUnavailable => "key_provider_unavailable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MissingToken => FailureKind::MissingToken,
            Self::MalformedToken(_) => FailureKind::MalformedToken,
            Self::UnsupportedAlgorithm(_) => FailureKind::UnsupportedAlgorithm,
            Self::UnknownKey(_) | Self::InvalidSignature => FailureKind::UnverifiableSignature,
            Self::Expired => FailureKind::Expired,
            Self::WrongAudience => FailureKind::WrongAudience,
            Self::WrongIssuer => FailureKind::WrongIssuer,
            Self::InsufficientScope(_) => FailureKind::InsufficientScope,
            Self::KeyProviderUnavailable(_) => FailureKind::KeyProviderUnavailable,
        }
    }

    /// Returns `true` if retrying the same request later may succeed.
    ///
    /// An unknown key may appear after the provider rotates, and an
    /// unreachable provider may come back.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::UnknownKey(_) | Self::KeyProviderUnavailable(_)
        )
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Provider outages fail closed with 401.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InsufficientScope(_) => 403,
            _ => 401,
        }
    }
}

/// Errors raised while constructing the verifier.
#[derive(Debug, Error)]
pub enum AuthSetupError {
    /// Only asymmetric algorithms may be allow-listed.
    #[error("algorithm {0:?} cannot be allow-listed: only asymmetric algorithms are accepted")]
    DisallowedAlgorithm(Algorithm),

    /// The HTTP client for key fetching could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
