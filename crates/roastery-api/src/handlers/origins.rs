//! Origin catalog handlers

use crate::error::AppError;
use crate::handlers::Pagination;
use crate::services::OriginInput;
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

/// Body of `POST /origins` and `PUT /origins/:id`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OriginRequest {
    #[validate(length(min = 1, max = 100, message = "country must be 1-100 characters"))]
    pub country: String,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(length(max = 200))]
    pub farm: Option<String>,
    #[validate(range(min = -500, max = 9000, message = "altitude out of range"))]
    pub altitude_m: Option<i32>,
}

impl From<OriginRequest> for OriginInput {
    fn from(request: OriginRequest) -> Self {
        Self {
            country: request.country,
            region: request.region,
            farm: request.farm,
            altitude_m: request.altitude_m,
        }
    }
}

pub async fn list_origins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let origins = state.catalog.list_origins(params.into()).await?;
    Ok(Json(origins))
}

pub async fn get_origin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let origin = state.catalog.get_origin(id).await?;
    Ok(Json(origin))
}

pub async fn create_origin(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OriginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let origin = state.catalog.create_origin(request.into()).await?;
    Ok((StatusCode::CREATED, Json(origin)))
}

pub async fn update_origin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OriginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let origin = state.catalog.update_origin(id, request.into()).await?;
    Ok(Json(origin))
}

/// Delete an origin; 409 while beans still reference it
pub async fn delete_origin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_origin(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_range() {
        let request: OriginRequest = serde_json::from_value(serde_json::json!({
            "country": "Colombia",
            "altitudeM": 12000
        }))
        .unwrap();

        assert!(request.validate().unwrap_err().field_errors().contains_key("altitude_m"));
    }
}
