//! Bearer token extraction.

use std::fmt;

use crate::error::{AuthError, Result};

/// A raw bearer token taken from an `Authorization` header.
///
/// The token is never logged; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively; the credential must be a
    /// single non-empty word.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` if the header is absent or is not a
    /// `Bearer` credential.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let (scheme, credential) = header.trim().split_once(' ').ok_or(AuthError::MissingToken)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MissingToken);
        }

        let credential = credential.trim();
        if credential.is_empty() || credential.contains(char::is_whitespace) {
            return Err(AuthError::MissingToken);
        }

        Ok(Self(credential.to_string()))
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
