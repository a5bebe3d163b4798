//! Gateway server wiring: router, middleware stack, listener.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

mod gate;
pub(crate) mod handlers;
pub mod state;

pub use state::{GatewayConfig, GatewayState};

/// Start the gateway server.
/// # Errors
/// Returns an error if the state cannot be built or the listener fails.
pub async fn new(config: GatewayConfig) -> Result<()> {
    let state = Arc::new(GatewayState::new(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Assemble the router: gateway-owned endpoints stay outside the gate, every
/// other path is resolved by the route-protection middleware before it reaches
/// the application.
pub(crate) fn router(state: Arc<GatewayState>) -> Router {
    let gated = Router::new()
        .fallback(handlers::page::page)
        .layer(middleware::from_fn_with_state(state.clone(), gate::gate));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/v1/auth/logout", post(handlers::auth::logout))
        .route("/v1/auth/profile", get(handlers::auth::profile))
        .merge(gated)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
