//! Authorization in front of a protected operation.

use std::future::Future;
use std::sync::Arc;

use crate::error::{AuthError, Result};
use crate::jwt::{TokenVerifier, ValidatedClaims};
use crate::permission::{check_permission, RequiredPermission};
use crate::token::BearerToken;

/// Guards one protected operation with one required permission.
///
/// A request moves through token extraction, verification and the permission
/// check in that order and stops at the first failure. Nothing is retried
/// here; key set refetches happen inside the key cache.
pub struct AuthMiddleware<V> {
    verifier: Arc<V>,
    required: RequiredPermission,
}

impl<V> AuthMiddleware<V>
where
    V: TokenVerifier,
{
    /// Create a guard for operations that need `required`.
    #[must_use]
    pub fn new(verifier: Arc<V>, required: RequiredPermission) -> Self {
        Self { verifier, required }
    }

    /// The permission this guard enforces.
    #[must_use]
    pub const fn required(&self) -> RequiredPermission {
        self.required
    }

    /// Authorize a request from its `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns the first failure: `MissingToken`, any verification failure,
    /// or `InsufficientScope`.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<ValidatedClaims> {
        let result = self.run(authorization).await;
        if let Err(err) = &result {
            tracing::warn!(
                permission = %self.required,
                kind = %err.kind(),
                error = %err,
                "Request not authorized"
            );
        }
        result
    }

    async fn run(&self, authorization: Option<&str>) -> Result<ValidatedClaims> {
        let token = BearerToken::from_authorization_header(authorization)?;
        let claims = self.verifier.verify(&token).await?;
        check_permission(&claims, self.required)?;

        tracing::debug!(
            subject = %claims.subject(),
            permission = %self.required,
            "Permission granted"
        );
        Ok(claims)
    }

    /// Authorize, then run `operation` with the validated claims.
    ///
    /// `operation` is never called when authorization fails.
    ///
    /// # Errors
    ///
    /// Returns the authorization failure converted into `E`, or whatever
    /// `operation` returns.
    pub async fn invoke<F, Fut, T, E>(
        &self,
        authorization: Option<&str>,
        operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(ValidatedClaims) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<AuthError>,
    {
        let claims = self.authorize(authorization).await?;
        operation(claims).await
    }
}

impl<V> Clone for AuthMiddleware<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            required: self.required,
        }
    }
}
