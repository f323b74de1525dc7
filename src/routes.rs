use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::auth::{api, auth_gateway, AuthState};
use crate::middleware::request_logging;

/// Create the API router.
///
/// Registration, token issuance, and logout are public; logout enforces its
/// own bearer-header requirement. The user listing and query endpoints sit
/// behind the auth gateway, which resolves the caller identity before the
/// handlers run.
pub fn create_router(state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/addNewUser", post(api::add_new_user))
        .route("/auth/generateToken", post(api::generate_token))
        .route("/auth/logout", post(api::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/users", get(api::get_users))
        .route("/auth/queryUsers", post(api::query_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_gateway))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
