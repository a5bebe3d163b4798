use axum::{
    extract::Request,
    response::{IntoResponse, Json},
};
use serde_json::json;

/// Stand-in for the application behind the gateway. Requests only reach this
/// handler after the route gate produced an `Allow` verdict; a deployment
/// fronting a real application replaces this with its own service.
pub async fn page(request: Request) -> impl IntoResponse {
    Json(json!({ "route": request.uri().path() }))
}
