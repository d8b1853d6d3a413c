//! HTTP request handlers.

pub mod drinks;
pub mod health;

use crate::error::ApiError;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("resource".to_string())
}
