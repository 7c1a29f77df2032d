use axum::{
    Router,
    routing::{delete, get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_lists))
        .route("/", post(handler::create_list))
        .route("/:id", get(handler::get_list))
        .route("/:id", delete(handler::delete_list))
}
