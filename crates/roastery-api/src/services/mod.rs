//! Catalog service layer
//!
//! Business rules for beans, origins, tags, reviews and user lists on top of
//! the repository handles in [`Catalog`]. Handlers call these directly.

mod beans;
mod lists;
mod origins;
mod reviews;
mod tags;

pub use beans::BeanInput;
pub use lists::ListInput;
pub use origins::OriginInput;
pub use reviews::{ReviewInput, ReviewUpdate};

use roastery_core::Catalog;

use crate::error::AppError;

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    catalog: Catalog,
}

impl CatalogService {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

fn not_found(kind: &str, id: uuid::Uuid) -> AppError {
    AppError::NotFound(format!("{kind} {id}"))
}

fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use roastery_core::UserRole;
    use uuid::Uuid;

    pub fn service() -> CatalogService {
        CatalogService::new(Catalog::in_memory())
    }

    pub fn actor(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            username: format!("{}-user", role.as_str()),
            email: format!("{}@x.com", role.as_str()),
            role,
            jti: Uuid::new_v4().to_string(),
        }
    }
}
