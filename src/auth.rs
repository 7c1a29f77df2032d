use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::api;
use crate::handler::AppState;

/// Rejects any request whose `Authorization` header is not exactly
/// `Bearer <token>` for the configured token. Mounted on the resource
/// routes; the healthcheck stays open.
pub async fn require_token(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.api_token);

    if !authorized {
        tracing::warn!("unauthorized request to {}", req.uri().path());
        return api::unauthorized("Unauthorized request");
    }

    next.run(req).await
}
