//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use coffee_shop_auth::TokenVerifier;
use coffee_shop_store::Store;

use crate::auth::{
    authorize_request, guard, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS,
};
use crate::handlers::{self, drinks, health};
use crate::state::AppState;

/// Create the API router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /drinks` - Drink menu, short form
///
/// ## Protected (one permission each)
/// - `GET /drinks-detail` - `get:drinks-detail`
/// - `POST /drinks` - `post:drinks`
/// - `PATCH /drinks/:drink_id` - `patch:drinks`
/// - `DELETE /drinks/:drink_id` - `delete:drinks`
pub fn create_router<S, V>(state: AppState<S, V>) -> Router
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();
    let verifier = Arc::clone(&state.verifier);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Drinks
        .route(
            "/drinks",
            get(drinks::list_drinks::<S, V>).merge(
                post(drinks::create_drink::<S, V>).route_layer(from_fn_with_state(
                    guard(&verifier, POST_DRINKS),
                    authorize_request::<V>,
                )),
            ),
        )
        .route(
            "/drinks-detail",
            get(drinks::list_drinks_detail::<S, V>).route_layer(from_fn_with_state(
                guard(&verifier, GET_DRINKS_DETAIL),
                authorize_request::<V>,
            )),
        )
        .route(
            "/drinks/:drink_id",
            patch(drinks::update_drink::<S, V>)
                .route_layer(from_fn_with_state(
                    guard(&verifier, PATCH_DRINKS),
                    authorize_request::<V>,
                ))
                .merge(delete(drinks::delete_drink::<S, V>).route_layer(
                    from_fn_with_state(guard(&verifier, DELETE_DRINKS), authorize_request::<V>),
                )),
        )
        .fallback(handlers::not_found)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
