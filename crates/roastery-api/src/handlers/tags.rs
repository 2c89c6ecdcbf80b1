//! Tag handlers

use crate::error::AppError;
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /tags` and `PUT /tags/:id`
#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
}

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let tags = state.catalog.list_tags(params.into()).await?;
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tag = state.catalog.get_tag(id).await?;
    Ok(Json(tag))
}

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TagRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let tag = state.catalog.create_tag(request.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TagRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let tag = state.catalog.update_tag(id, request.name).await?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
