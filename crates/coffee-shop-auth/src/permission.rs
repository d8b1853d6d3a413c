//! Permission checks against validated claims.

use std::fmt;

use crate::error::{AuthError, Result};
use crate::jwt::ValidatedClaims;

/// The single permission a protected route requires.
///
/// Declared when the route is registered, never taken from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequiredPermission(&'static str);

impl RequiredPermission {
    /// Declare a required permission, e.g. `"post:drinks"`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The permission string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Require `required` to be among the granted permissions.
///
/// Strings are compared for exact equality; there is no wildcard or prefix
/// matching.
///
/// # Errors
///
/// Returns `AuthError::InsufficientScope` if the permission is absent.
pub fn check_permission(claims: &ValidatedClaims, required: RequiredPermission) -> Result<()> {
    if claims.has_permission(required.as_str()) {
        Ok(())
    } else {
        Err(AuthError::InsufficientScope(required.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims_with_permissions;

    const GET_DETAIL: RequiredPermission = RequiredPermission::new("get:drinks-detail");
    const POST: RequiredPermission = RequiredPermission::new("post:drinks");

    #[test]
    fn granted_permission_passes() {
        let claims = claims_with_permissions(&["get:drinks-detail"]);
        assert!(check_permission(&claims, GET_DETAIL).is_ok());
    }

    #[test]
    fn absent_permission_is_insufficient_scope() {
        let claims = claims_with_permissions(&["get:drinks-detail"]);
        assert_eq!(
            check_permission(&claims, POST),
            Err(AuthError::InsufficientScope("post:drinks".to_string()))
        );
    }

    #[test]
    fn empty_permission_set_never_passes() {
        let claims = claims_with_permissions(&[]);
        assert!(check_permission(&claims, GET_DETAIL).is_err());
        assert!(check_permission(&claims, POST).is_err());
    }

    #[test]
    fn no_partial_or_wildcard_matches() {
        let claims = claims_with_permissions(&["post:*", "post:drinks-extra", "POST:DRINKS", "post"]);
        assert!(check_permission(&claims, POST).is_err());
    }
}
