//! User Directory API Endpoints
//! Mission: Registration, token issuance, user queries, and logout

use crate::auth::{
    jwt::{TokenError, TokenService},
    models::{
        AuthContext, AuthRequest, NewUser, Page, PageParams, UserQuery, UserResponse, UserSummary,
    },
    user_store::UserStore,
};
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<UserStore>,
    pub tokens: Arc<TokenService>,
}

/// Register a new user - POST /auth/addNewUser
///
/// The response body always carries the `{status, userId}` shape; only the
/// status code and message vary.
pub async fn add_new_user(
    State(state): State<AuthState>,
    Json(candidate): Json<NewUser>,
) -> (StatusCode, Json<UserResponse>) {
    let violations = candidate.validate();
    if !violations.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(UserResponse {
                status: format!("Validation failed: {}", violations.join(", ")),
                user_id: None,
            }),
        );
    }

    let username = candidate.user_name.as_deref().unwrap_or_default();
    match state.users.username_exists(username) {
        Ok(true) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UserResponse {
                    status: "Username already exists".to_string(),
                    user_id: None,
                }),
            );
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to check username {}: {}", username, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UserResponse {
                    status: "User creation failed".to_string(),
                    user_id: None,
                }),
            );
        }
    }

    match state.users.create_user(&candidate) {
        Ok(user_id) => (
            StatusCode::OK,
            Json(UserResponse {
                status: "success".to_string(),
                user_id: Some(user_id),
            }),
        ),
        Err(e) => {
            error!("Failed to create user {}: {}", username, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UserResponse {
                    status: "User creation failed".to_string(),
                    user_id: None,
                }),
            )
        }
    }
}

/// Verify credentials and issue a token - POST /auth/generateToken
///
/// Returns the raw compact token string on success.
pub async fn generate_token(
    State(state): State<AuthState>,
    Json(payload): Json<AuthRequest>,
) -> Result<String, AuthApiError> {
    info!("🔐 Token request: {}", payload.user_name);

    let valid = state
        .users
        .verify_password(&payload.user_name, &payload.pass_word)
        .map_err(|e| {
            error!("Credential check failed: {}", e);
            AuthApiError::InternalError
        })?;

    if !valid {
        warn!("❌ Failed login attempt: {}", payload.user_name);
        return Err(AuthApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(&payload.user_name).map_err(|e| match e {
        TokenError::SubjectNotFound(_) => AuthApiError::InvalidCredentials,
        other => {
            error!("Token issuance failed: {}", other);
            AuthApiError::InternalError
        }
    })?;

    info!("✅ Token issued: {}", payload.user_name);

    Ok(token)
}

/// Paginated user listing - GET /auth/users
pub async fn get_users(
    State(state): State<AuthState>,
    context: Option<Extension<AuthContext>>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<UserSummary>>, AuthApiError> {
    if context.is_none() {
        return Err(AuthApiError::Unauthorized);
    }

    let (users, total) = state.users.list_users(page).map_err(|e| {
        error!("User listing failed: {}", e);
        AuthApiError::InternalError
    })?;

    let summaries = users.iter().map(UserSummary::from_user).collect();
    Ok(Json(Page::new(summaries, page, total)))
}

/// Filtered user query - POST /auth/queryUsers
pub async fn query_users(
    State(state): State<AuthState>,
    context: Option<Extension<AuthContext>>,
    Query(page): Query<PageParams>,
    Json(filter): Json<UserQuery>,
) -> Result<Json<Page<UserSummary>>, AuthApiError> {
    if context.is_none() {
        return Err(AuthApiError::Unauthorized);
    }

    let (users, total) = state.users.query_users(&filter, page).map_err(|e| {
        error!("User query failed: {}", e);
        AuthApiError::InternalError
    })?;

    let summaries = users.iter().map(UserSummary::from_user).collect();
    Ok(Json(Page::new(summaries, page, total)))
}

/// Revoke the presented bearer token - POST /auth/logout
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<String, AuthApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthApiError::InvalidAuthHeader)?;

    state.tokens.revoke(token).map_err(|e| match e {
        TokenError::EmptyToken => AuthApiError::EmptyToken,
        TokenError::TokenNotFound => AuthApiError::TokenNotFound,
        other => {
            error!("Token revocation failed: {}", other);
            AuthApiError::InternalError
        }
    })?;

    Ok("Token successfully invalidated.".to_string())
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    Unauthorized,
    InvalidAuthHeader,
    TokenNotFound,
    EmptyToken,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::InvalidAuthHeader => {
                (StatusCode::UNAUTHORIZED, "Invalid authorization header")
            }
            AuthApiError::TokenNotFound => (StatusCode::NOT_FOUND, "Token not found"),
            AuthApiError::EmptyToken => (StatusCode::BAD_REQUEST, "Token cannot be empty"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_api_error_responses() {
        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let unauthorized = AuthApiError::Unauthorized.into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let bad_header = AuthApiError::InvalidAuthHeader.into_response();
        assert_eq!(bad_header.status(), StatusCode::UNAUTHORIZED);

        let not_found = AuthApiError::TokenNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let empty = AuthApiError::EmptyToken.into_response();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let internal = AuthApiError::InternalError.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
