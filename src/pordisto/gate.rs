//! Route-protection middleware.
//!
//! Every request entering the gated router passes through [`gate`]: resolve the
//! credential, look up the identity record through the single-flight cache, and
//! act on the policy verdict. Public routes never trigger an upstream fetch.

use crate::access::{normalize, Identity, Verdict};
use crate::pordisto::state::GatewayState;
use crate::profile::cache_key;
use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) async fn gate(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = normalize(request.uri().path());
    let identity = resolve_identity(&state, request.headers(), &route).await;
    let verdict = state.policy.decide(&identity, &route);
    debug!(route = %route, verdict = ?verdict, "Access decision");

    match verdict {
        Verdict::Allow => next.run(request).await,
        Verdict::RedirectLogin => redirect_to(&state.login_route),
        Verdict::RedirectHome => redirect_to(&state.home_route),
        Verdict::RedirectDenied => redirect_to(&state.denied_route),
    }
}

async fn resolve_identity(state: &GatewayState, headers: &HeaderMap, route: &str) -> Identity {
    let Some(token) = extract_token(headers, &state.token_cookie) else {
        return Identity::Anonymous;
    };
    // Public routes are decided on credential presence alone; no fetch.
    if state.policy.is_public(route) {
        return Identity::Presented;
    }

    let key = cache_key(token.expose_secret());
    let client = state.client.clone();
    match state
        .cache
        .get(&key, state.cache_ttl, move || async move {
            client.fetch(&token).await
        })
        .await
    {
        Ok(profile) => Identity::Known(profile),
        Err(err) => {
            warn!("Identity lookup failed: {err}");
            Identity::Failed(err)
        }
    }
}

/// Pull the credential from the configured cookie, falling back to a bearer
/// `Authorization` header.
pub(crate) fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<SecretString> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name && !val.is_empty() {
            return Some(SecretString::from(val.to_string()));
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(SecretString::from(token.to_string()))
    }
}

fn redirect_to(route: &str) -> Response {
    Redirect::temporary(&format!("/{route}")).into_response()
}
