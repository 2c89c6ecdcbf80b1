//! User list handlers

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::handlers::Pagination;
use crate::services::ListInput;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /lists` and `PUT /lists/:id`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl From<ListRequest> for ListInput {
    fn from(request: ListRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            is_public: request.is_public,
        }
    }
}

/// Lists owned by the caller
pub async fn list_my_lists(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let lists = state.catalog.list_user_lists(&user, params.into()).await?;
    Ok(Json(lists))
}

/// A public list, or a private one viewed by its owner
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthenticatedUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.map(|Extension(user)| user);
    let list = state.catalog.get_list(viewer.as_ref(), id).await?;
    Ok(Json(list))
}

pub async fn create_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ListRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let list = state.catalog.create_list(&user, request.into()).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ListRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let list = state.catalog.update_list(&user, id, request.into()).await?;
    Ok(Json(list))
}

pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_list(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_bean(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, bean_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let list = state.catalog.add_bean_to_list(&user, id, bean_id).await?;
    Ok(Json(list))
}

pub async fn remove_bean(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, bean_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let list = state
        .catalog
        .remove_bean_from_list(&user, id, bean_id)
        .await?;
    Ok(Json(list))
}
