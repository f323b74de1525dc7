//! Auth Gateway
//! Mission: Resolve caller identity from the Authorization header

use crate::auth::api::AuthState;
use crate::auth::models::AuthContext;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Per-request gateway: inspect the Authorization header and, when the
/// caller can be identified, attach an `AuthContext` to the request
/// extensions. The gateway never rejects a request itself; handlers that
/// require identity map a missing context to 401.
pub async fn auth_gateway(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    if let Some(context) = resolve_identity(&state, req.headers()) {
        req.extensions_mut().insert(context);
    }
    next.run(req).await
}

/// Resolve the caller identity from a bearer token or Basic credentials.
///
/// Unknown schemes and absent headers resolve to no identity.
pub fn resolve_identity(state: &AuthState, headers: &HeaderMap) -> Option<AuthContext> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        bearer_identity(state, token)
    } else if let Some(encoded) = header.strip_prefix("Basic ") {
        basic_identity(state, encoded)
    } else {
        None
    }
}

/// Bearer path: structural validation, then the full contextual check
/// against the ledger. A structurally valid but revoked token resolves to
/// no identity, so protected endpoints reject it after logout.
fn bearer_identity(state: &AuthState, token: &str) -> Option<AuthContext> {
    if !state.tokens.validate(token) {
        return None;
    }

    let subject = state.tokens.subject_of(token).ok()?;
    let user = state.users.get_user_by_username(&subject).ok().flatten()?;

    state
        .tokens
        .validate_for_subject(token, &user.username)
        .then(|| AuthContext::from_user(&user))
}

/// Basic path: base64-decode, split at the first colon, verify against the
/// credential store. Every failure mode, including store errors, is treated
/// as an authentication failure.
fn basic_identity(state: &AuthState, encoded: &str) -> Option<AuthContext> {
    let decoded = String::from_utf8(BASE64.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;

    if !state.users.verify_password(username, password).unwrap_or(false) {
        return None;
    }

    let user = state.users.get_user_by_username(username).ok().flatten()?;
    Some(AuthContext::from_user(&user))
}
