//! Authentication HTTP handlers.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::Deserialize;
use tuner_types::{AccessTokenResponse, StatusResponse, User};

use crate::error::{ApiError, ApiResult};
use crate::models::NewUser;
use crate::AppState;

use super::jwt::REFRESH_TOKEN_TTL_SECS;
use super::middleware::{
    build_cookie, clear_cookie, read_cookie, REFRESH_COOKIE, REFRESH_COOKIE_PATH, STATE_COOKIE,
    STATE_COOKIE_MAX_AGE,
};
use super::oauth::OAuthError;
use super::types::AuthUser;

/// Bytes of entropy in the anti-forgery nonce.
const STATE_BYTES: usize = 32;

/// Start Google OAuth login flow.
///
/// Stores a fresh nonce in the `oauth_state` cookie and redirects the browser to the
/// consent screen with the same nonce as `state`.
pub async fn google_login(State(state): State<AppState>) -> ApiResult<Response> {
    let nonce = random_state(&mut OsRng)?;
    let cookie = build_cookie(
        STATE_COOKIE,
        &nonce,
        "/",
        STATE_COOKIE_MAX_AGE,
        state.settings.cookie_secure,
    );

    tracing::info!("Starting Google login");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::temporary(&state.provider.authorize_url(&nonce)),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Handle Google OAuth callback.
///
/// Rejects the request unless the `state` parameter matches the nonce cookie. Once the
/// nonce is accepted it is cleared, whatever happens in the later steps.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    if let Err(err) = verify_state(&headers, params.state.as_deref()) {
        return err.into_response();
    }

    let clear_state = clear_cookie(STATE_COOKIE, "/", state.settings.cookie_secure);

    match complete_login(&state, params.code.as_deref()).await {
        Ok((refresh_cookie, redirect_to)) => (
            AppendHeaders([
                (header::SET_COOKIE, clear_state),
                (header::SET_COOKIE, refresh_cookie),
            ]),
            Redirect::temporary(&redirect_to),
        )
            .into_response(),
        Err(err) => (AppendHeaders([(header::SET_COOKIE, clear_state)]), err).into_response(),
    }
}

fn verify_state(headers: &HeaderMap, returned: Option<&str>) -> ApiResult<()> {
    let expected = read_cookie(headers, STATE_COOKIE);

    match (expected.as_deref(), returned) {
        (Some(expected), Some(returned)) if expected.as_bytes() == returned.as_bytes() => Ok(()),
        (None, _) => {
            tracing::warn!("OAuth callback without state cookie");
            Err(ApiError::bad_request("invalid state"))
        }
        _ => {
            tracing::warn!("OAuth callback state mismatch");
            Err(ApiError::bad_request("invalid state"))
        }
    }
}

/// Exchange, fetch, upsert, issue. Returns the refresh cookie and the frontend URL.
async fn complete_login(state: &AppState, code: Option<&str>) -> ApiResult<(String, String)> {
    let code = code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing code"))?;

    let provider_token = state
        .provider
        .exchange_code(code)
        .await
        .map_err(oauth_error)?;

    let profile = state
        .provider
        .fetch_profile(&provider_token)
        .await
        .map_err(oauth_error)?;

    tracing::info!("OAuth login attempt from: {}", profile.email);

    let user = state
        .users
        .upsert_by_google_id(&NewUser::new(
            &profile.external_id,
            &profile.email,
            &profile.name,
            &profile.picture,
        ))
        .await
        .map_err(|e| ApiError::from(e.context("failed to save user")))?;

    let access_token = state.tokens.generate_access_token(user.id)?;
    let refresh_token = state.tokens.generate_refresh_token(user.id)?;

    let refresh_cookie = build_cookie(
        REFRESH_COOKIE,
        &refresh_token,
        REFRESH_COOKIE_PATH,
        REFRESH_TOKEN_TTL_SECS,
        state.settings.cookie_secure,
    );

    let redirect_to = format!(
        "{}/auth/callback?token={}",
        state.settings.frontend_url,
        urlencoding::encode(&access_token)
    );

    tracing::info!("Successful login for user {}", user.id);

    Ok((refresh_cookie, redirect_to))
}

fn oauth_error(err: OAuthError) -> ApiError {
    match err {
        OAuthError::Exchange(_) => {
            tracing::warn!("{}", err);
            ApiError::bad_request("failed to exchange token")
        }
        OAuthError::Profile(_) => ApiError::Internal(anyhow::Error::new(err)),
    }
}

/// Issue a new access token from the refresh cookie.
///
/// The refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token = read_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("no refresh token"))?;

    let claims = state
        .tokens
        .validate_token(&token)
        .map_err(|e| ApiError::invalid_token("invalid refresh token", e))?;

    let access_token = state.tokens.generate_access_token(claims.user_id()?)?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// Logout - clear the refresh cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_cookie(
        REFRESH_COOKIE,
        REFRESH_COOKIE_PATH,
        state.settings.cookie_secure,
    );

    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(StatusResponse::ok()),
    )
}

/// Get current authenticated user.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<User>> {
    let user = state
        .users
        .get_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

fn random_state(rng: &mut impl RngCore) -> ApiResult<String> {
    let mut bytes = [0u8; STATE_BYTES];
    rng.try_fill_bytes(&mut bytes).map_err(|e| {
        ApiError::Internal(anyhow::Error::new(e).context("failed to generate state"))
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
