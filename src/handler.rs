use std::sync::Arc;

use axum::{
    Json, Router,
    http::Method,
    middleware,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::auth::require_token;
use crate::db::Database;
use crate::{bookmark, list};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub api_token: String,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(serde_json::json!({ "status": "ok" }))
}

/// Builds the full application router: an open healthcheck, the
/// token-protected resource routes, permissive CORS on top.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let api = Router::new()
        .nest("/bookmarks", bookmark::routes())
        .nest("/lists", list::routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/", get(healthcheck))
        .merge(api)
        .layer(cors)
        .with_state(state)
}
