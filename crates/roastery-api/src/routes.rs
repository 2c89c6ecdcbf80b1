//! API route definitions

use crate::auth::middleware::{auth_middleware, optional_auth_middleware, require_any_role};
use crate::handlers::{auth, beans, lists, origins, reviews, tags};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use roastery_core::UserRole;
use std::sync::Arc;

/// Roles allowed to edit the catalog (admin always passes)
const CATALOG_MANAGERS: &[UserRole] = &[UserRole::Brewer];

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/beans", get(beans::list_beans))
        .route("/beans/:id", get(beans::get_bean))
        .route("/beans/:id/reviews", get(beans::list_bean_reviews))
        .route("/origins", get(origins::list_origins))
        .route("/origins/:id", get(origins::get_origin))
        .route("/tags", get(tags::list_tags))
        .route("/tags/:id", get(tags::get_tag))
        .route("/reviews/:id", get(reviews::get_review));

    // Readable anonymously, but private lists need their owner's token
    let viewer_routes = Router::new()
        .route("/lists/:id", get(lists::get_list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/revoke", post(auth::revoke_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/reviews", post(reviews::create_review))
        .route(
            "/reviews/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/lists", get(lists::list_my_lists).post(lists::create_list))
        .route("/lists/:id", put(lists::update_list).delete(lists::delete_list))
        .route(
            "/lists/:id/beans/:bean_id",
            post(lists::add_bean).delete(lists::remove_bean),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Catalog management (brewer or admin)
    let catalog_routes = Router::new()
        .route("/beans", post(beans::create_bean))
        .route("/beans/:id", put(beans::update_bean))
        .route("/beans/:id", delete(beans::delete_bean))
        .route("/origins", post(origins::create_origin))
        .route("/origins/:id", put(origins::update_origin))
        .route("/origins/:id", delete(origins::delete_origin))
        .route("/tags", post(tags::create_tag))
        .route("/tags/:id", put(tags::update_tag))
        .route("/tags/:id", delete(tags::delete_tag))
        .route_layer(middleware::from_fn(require_any_role(CATALOG_MANAGERS)))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes)
        .merge(catalog_routes)
}
