//! Bean catalog handlers

use crate::error::AppError;
use crate::handlers::Pagination;
use crate::services::BeanInput;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use roastery_core::RoastLevel;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /beans` and `PUT /beans/:id`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BeanRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "roaster must be 1-200 characters"))]
    pub roaster: String,
    pub origin_id: Option<Uuid>,
    #[serde(default)]
    pub roast_level: RoastLevel,
    #[validate(length(max = 100))]
    pub process: Option<String>,
    #[validate(length(max = 2000))]
    pub tasting_notes: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl From<BeanRequest> for BeanInput {
    fn from(request: BeanRequest) -> Self {
        Self {
            name: request.name,
            roaster: request.roaster,
            origin_id: request.origin_id,
            roast_level: request.roast_level,
            process: request.process,
            tasting_notes: request.tasting_notes,
            tag_ids: request.tag_ids,
        }
    }
}

pub async fn list_beans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let beans = state.catalog.list_beans(params.into()).await?;
    Ok(Json(beans))
}

pub async fn get_bean(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bean = state.catalog.get_bean(id).await?;
    Ok(Json(bean))
}

/// Reviews of one bean, oldest first
pub async fn list_bean_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = state.catalog.list_bean_reviews(id, params.into()).await?;
    Ok(Json(reviews))
}

pub async fn create_bean(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BeanRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let bean = state.catalog.create_bean(request.into()).await?;
    Ok((StatusCode::CREATED, Json(bean)))
}

pub async fn update_bean(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<BeanRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let bean = state.catalog.update_bean(id, request.into()).await?;
    Ok(Json(bean))
}

/// Delete a bean with its reviews and list memberships
pub async fn delete_bean(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_bean(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
