//! HTTP handlers for the bookmarks API.

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
use crate::sanitize;
use crate::validate;

pub async fn list_bookmarks(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bookmarks: Vec<_> = state
        .db
        .list_bookmarks()
        .await?
        .into_iter()
        .map(sanitize::bookmark)
        .collect();

    info!("listed {} bookmarks", bookmarks.len());
    Ok(Json(bookmarks).into_response())
}

pub async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.db.get_bookmark(id).await? {
        Some(bookmark) => Ok(Json(sanitize::bookmark(bookmark)).into_response()),
        None => {
            info!("bookmark with id {} not found", id);
            Err(ApiError::bookmark_not_found())
        }
    }
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let input = validate::new_bookmark(&payload)?;
    let bookmark = state.db.create_bookmark(input).await?;

    info!("bookmark with id {} created", bookmark.id);
    let location = format!("/bookmarks/{}", bookmark.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sanitize::bookmark(bookmark)),
    )
        .into_response())
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    // Unknown ids answer 404 before the body is looked at, so a body-less
    // PATCH to a missing bookmark is still a not-found, not a bad request.
    if state.db.get_bookmark(id).await?.is_none() {
        info!("bookmark with id {} not found", id);
        return Err(ApiError::bookmark_not_found());
    }

    let payload = payload.map_or(Value::Null, |Json(body)| body);
    let patch = validate::bookmark_patch(&payload)?;

    if state.db.update_bookmark(id, patch).await?.is_some() {
        info!("bookmark with id {} updated", id);
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    } else {
        info!("bookmark with id {} not found", id);
        Err(ApiError::bookmark_not_found())
    }
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    if state.db.delete_bookmark(id).await? {
        info!("bookmark with id {} deleted", id);
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    } else {
        info!("bookmark with id {} not found", id);
        Err(ApiError::bookmark_not_found())
    }
}
