//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::types::AuthUser;

/// Name of the anti-forgery nonce cookie set at login.
pub const STATE_COOKIE: &str = "oauth_state";
/// Lifetime of the nonce cookie, in seconds.
pub const STATE_COOKIE_MAX_AGE: i64 = 300;

pub const REFRESH_COOKIE: &str = "refresh_token";
/// Refresh cookies are only sent back to the auth endpoints.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Middleware function that requires a bearer access token.
///
/// This can be used with `axum::middleware::from_fn_with_state` to protect routes.
/// On success the user id is stored in the request extensions as [`AuthUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

    let token = value
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("invalid authorization format"))?;

    let claims = state.tokens.validate_token(token)?;

    Ok(AuthUser {
        user_id: claims.user_id()?,
    })
}

fn extract_bearer_token(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ")
}

/// Read a cookie value from the request. Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| cookie::Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Build a `Set-Cookie` value for an HTTP-only, lax same-site cookie.
pub fn build_cookie(name: &str, value: &str, path: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path={}; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, path, max_age, secure
    )
}

/// Build a `Set-Cookie` value that expires the named cookie immediately.
pub fn clear_cookie(name: &str, path: &str, secure: bool) -> String {
    build_cookie(name, "", path, 0, secure)
}
