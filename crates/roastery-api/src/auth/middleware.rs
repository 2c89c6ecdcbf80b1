/// Authentication middleware for protecting routes
///
/// Extracts and validates the Bearer access token from the Authorization
/// header. On success, adds the authenticated user to request extensions.
use super::jwt::{Claims, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use roastery_core::UserRole;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user information extracted from the access token
///
/// Handlers receive it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    /// JWT ID of the presented token
    pub jti: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owner of a resource, or an admin
    pub fn can_modify(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims.user_id().ok_or(JwtError::InvalidToken)?;
        let role = claims.role.parse().map_err(|_| JwtError::InvalidToken)?;

        Ok(Self {
            user_id,
            username: claims.name,
            email: claims.email,
            role,
            jti: claims.jti,
        })
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AccessError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing Authorization header",
            ),
            AccessError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid Authorization header format",
            ),
            AccessError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or expired token",
            ),
            AccessError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient permissions",
            ),
        };

        (status, Json(ApiError::new(code, message))).into_response()
    }
}

/// Authentication middleware that requires a valid access token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use roastery_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AccessError> {
    let ip_address = extract_ip_address(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AccessError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AccessError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AccessError::InvalidAuthHeader)?;

    let user = match state
        .auth
        .tokens()
        .validate_access_token(token)
        .and_then(AuthenticatedUser::try_from)
    {
        Ok(user) => user,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address,
                user_agent,
                reason: e.to_string(),
            });
            return Err(AccessError::InvalidToken(e));
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Attaches the user when a valid Bearer token is present; anonymous and
/// invalid requests pass through unchanged.
pub async fn optional_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| state.auth.tokens().validate_access_token(token).ok())
        .and_then(|claims| AuthenticatedUser::try_from(claims).ok());

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Type alias for role middleware future
type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AccessError>> + Send>>;

/// Middleware factory requiring any of the given roles
///
/// Must run after [`auth_middleware`]. Admin always passes.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, routing::post, Router};
/// use roastery_api::auth::middleware::{auth_middleware, require_any_role};
/// use roastery_core::UserRole;
///
/// let app = Router::new()
///     .route("/beans", post(create_bean))
///     .route_layer(middleware::from_fn(require_any_role(&[UserRole::Brewer])))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub fn require_any_role(
    required_roles: &'static [UserRole],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<AuthenticatedUser>()
                .ok_or(AccessError::MissingAuthHeader)?
                .clone();

            if user.is_admin() || required_roles.contains(&user.role) {
                return Ok(next.run(request).await);
            }

            let roles: Vec<&str> = required_roles.iter().map(UserRole::as_str).collect();
            audit_log(&AuditEvent::AccessDenied {
                user_id: user.user_id,
                resource: format!("{} {}", request.method(), request.uri().path()),
                required_role: Some(roles.join(",")),
            });

            Err(AccessError::InsufficientPermissions)
        })
    }
}
