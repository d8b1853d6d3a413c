//! Per-route authorization layer.
//!
//! Each protected route gets its own [`AuthMiddleware`] with exactly one
//! [`RequiredPermission`], mounted with `route_layer`. The layer reads the
//! `Authorization` header, runs the guard, and hands the validated claims to
//! the handler through request extensions. Handlers never see a request that
//! failed authorization.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use coffee_shop_auth::{AuthMiddleware, RequiredPermission, TokenVerifier};

use crate::error::ApiError;

/// Permission for `GET /drinks-detail`.
pub const GET_DRINKS_DETAIL: RequiredPermission = RequiredPermission::new("get:drinks-detail");
/// Permission for `POST /drinks`.
pub const POST_DRINKS: RequiredPermission = RequiredPermission::new("post:drinks");
/// Permission for `PATCH /drinks/:id`.
pub const PATCH_DRINKS: RequiredPermission = RequiredPermission::new("patch:drinks");
/// Permission for `DELETE /drinks/:id`.
pub const DELETE_DRINKS: RequiredPermission = RequiredPermission::new("delete:drinks");

/// Build the guard for one route.
#[must_use]
pub fn guard<V>(verifier: &Arc<V>, permission: RequiredPermission) -> AuthMiddleware<V>
where
    V: TokenVerifier,
{
    AuthMiddleware::new(Arc::clone(verifier), permission)
}

/// Middleware function for `axum::middleware::from_fn_with_state`.
///
/// On success the request continues with `ValidatedClaims` in its
/// extensions; on failure the error response is returned directly.
pub async fn authorize_request<V>(
    State(guard): State<AuthMiddleware<V>>,
    request: Request,
    next: Next,
) -> Response
where
    V: TokenVerifier + 'static,
{
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let result: Result<Response, ApiError> = guard
        .invoke(header.as_deref(), |claims| async move {
            let mut request = request;
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        })
        .await;

    result.unwrap_or_else(IntoResponse::into_response)
}
