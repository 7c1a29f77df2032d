//! HTTP handlers for the lists API.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::handler::AppState;
use crate::validate;

pub async fn list_lists(State(state): State<AppState>) -> Result<Response, ApiError> {
    let lists = state.db.list_lists().await?;
    info!("listed {} lists", lists.len());
    Ok(Json(lists).into_response())
}

pub async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.db.get_list(id).await? {
        Some(list) => Ok(Json(list).into_response()),
        None => {
            info!("list with id {} not found", id);
            Err(ApiError::list_not_found())
        }
    }
}

pub async fn create_list(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let input = validate::new_list(&payload)?;

    match state.db.create_list(input).await? {
        Some(list) => {
            info!("list with id {} created", list.id);
            let location = format!("/lists/{}", list.id);
            Ok((
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(list),
            )
                .into_response())
        }
        None => Err(ApiError::Validation(
            "'bookmarkIds' references a bookmark that does not exist".to_string(),
        )),
    }
}

pub async fn delete_list(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    if state.db.delete_list(id).await? {
        info!("list with id {} deleted", id);
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    } else {
        info!("list with id {} not found", id);
        Err(ApiError::list_not_found())
    }
}
