//! Authentication API handlers
//!
//! Registration, login, token refresh and revocation, and the caller's
//! profile.

use crate::auth::{
    AuthenticatedUser, LoginRequest, NewUser, RefreshRequest, RegisterRequest, RevokeRequest,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

impl From<RegisterRequest> for NewUser {
    fn from(request: RegisterRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
        }
    }
}

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - Account created, returns tokens
/// * `400 Bad Request` - Invalid input
/// * `409 Conflict` - Username or email already taken
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = state.auth.register(NewUser::from(request)).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with username and password
///
/// # Responses
///
/// * `200 OK` - Returns tokens
/// * `401 Unauthorized` - Invalid credentials
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = state.auth.login(&request.username, &request.password).await?;

    Ok(Json(response))
}

/// Exchange an expired access token and a refresh token for a new pair
///
/// The presented refresh token is consumed.
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = state
        .auth
        .refresh_token(&request.token, &request.refresh_token)
        .await?;

    Ok(Json(response))
}

/// Revoke one of the caller's refresh tokens
///
/// # Responses
///
/// * `204 No Content` - Token revoked
/// * `404 Not Found` - No active token with that value
pub async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RevokeRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let revoked = state
        .auth
        .revoke_token(&request.refresh_token, user.user_id, request.reason.as_deref())
        .await?;

    if !revoked {
        return Err(AppError::NotFound("refresh token".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Profile of the authenticated user
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let user_info = state.auth.current_user(user.user_id).await?;

    Ok(Json(user_info))
}
