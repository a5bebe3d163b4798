//! Logout and profile endpoints.

use crate::pordisto::{gate::extract_token, state::GatewayState};
use crate::profile::{cache_key, FetchError};
use axum::{
    extract::Extension,
    http::{
        header::{HeaderValue, InvalidHeaderValue, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::warn;

// Legacy cookies set alongside the access token by the frontend; logout clears
// all of them.
const COMPANION_COOKIES: [&str; 2] = ["user", "refresh_token"];

/// Drop the cached identity record for the calling credential and clear the
/// auth cookies. The cache entry is removed before the response is sent, so a
/// re-login never observes the logged-out record.
pub async fn logout(headers: HeaderMap, state: Extension<Arc<GatewayState>>) -> impl IntoResponse {
    if let Some(token) = extract_token(&headers, &state.token_cookie) {
        state.cache.invalidate(&cache_key(token.expose_secret()));
    }

    // Always clear the cookies, even when no credential was presented.
    let mut response_headers = HeaderMap::new();
    for name in std::iter::once(state.token_cookie.as_str()).chain(COMPANION_COOKIES) {
        if let Ok(cookie) = clear_cookie(name) {
            response_headers.append(SET_COOKIE, cookie);
        }
    }
    (StatusCode::NO_CONTENT, response_headers)
}

/// Serve the caller's identity record through the same single-flight cache the
/// route gate uses.
pub async fn profile(headers: HeaderMap, state: Extension<Arc<GatewayState>>) -> Response {
    let Some(token) = extract_token(&headers, &state.token_cookie) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let key = cache_key(token.expose_secret());
    let client = state.client.clone();
    match state
        .cache
        .get(&key, state.cache_ttl, move || async move {
            client.fetch(&token).await
        })
        .await
    {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => {
            warn!("Profile lookup failed: {err}");
            status_for(&err).into_response()
        }
    }
}

fn clear_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0").parse()
}

fn status_for(err: &FetchError) -> StatusCode {
    match err {
        FetchError::Unauthorized => StatusCode::UNAUTHORIZED,
        FetchError::Forbidden => StatusCode::FORBIDDEN,
        FetchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}
