//! Roastery Core - Domain models, storage traits, and shared types
//!
//! This crate defines the core abstractions used throughout Roastery:
//! - Catalog models (beans, origins, tags, reviews, user lists)
//! - User accounts and their refresh tokens
//! - Common error types
//! - Repository traits with in-memory and PostgreSQL implementations
//! - Configuration management

pub mod config;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use memory::{InMemoryRepository, InMemoryUserStore};
pub use models::{
    Bean, Entity, Origin, Page, RefreshToken, Review, RoastLevel, Tag, User, UserList, UserRole,
};
pub use postgres::PgStore;
pub use store::{
    BeanRepository, Catalog, Repository, ReviewRepository, TagRepository, UserListRepository,
    UserStore,
};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for storage and domain operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                CoreError::Conflict(db.message().to_string())
            }
            other => CoreError::DatabaseError(other.to_string()),
        }
    }
}
