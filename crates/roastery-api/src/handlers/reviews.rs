//! Review handlers
//!
//! Anyone may read a review; writing one requires authentication, and only
//! the author or an admin may change it afterwards.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::services::{ReviewInput, ReviewUpdate};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /reviews`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub bean_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[validate(length(max = 100))]
    pub brew_method: Option<String>,
}

/// Body of `PUT /reviews/:id`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[validate(length(max = 100))]
    pub brew_method: Option<String>,
}

impl From<CreateReviewRequest> for ReviewInput {
    fn from(request: CreateReviewRequest) -> Self {
        Self {
            bean_id: request.bean_id,
            rating: request.rating,
            comment: request.comment,
            brew_method: request.brew_method,
        }
    }
}

impl From<UpdateReviewRequest> for ReviewUpdate {
    fn from(request: UpdateReviewRequest) -> Self {
        Self {
            rating: request.rating,
            comment: request.comment,
            brew_method: request.brew_method,
        }
    }
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let review = state.catalog.get_review(id).await?;
    Ok(Json(review))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let review = state.catalog.create_review(&user, request.into()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let review = state.catalog.update_review(&user, id, request.into()).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_review(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
