//! Storage traits
//!
//! Services receive these as explicit handles at construction; there is no
//! ambient or global store.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::memory::{InMemoryRepository, InMemoryUserStore};
use crate::models::{Bean, Entity, Origin, Page, Review, Tag, User, UserList};
use crate::postgres::PgStore;
use crate::Result;

/// Credential store holding user aggregates (user row plus refresh tokens)
///
/// `update` persists the whole aggregate, including newly appended or revoked
/// refresh tokens. Implementations provide per-call atomicity only; a
/// read-modify-write sequence spanning several calls is not guarded.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Case-insensitive existence check
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Insert a new user; fails with `CoreError::Conflict` on a duplicate username or email
    async fn insert(&self, user: &User) -> Result<()>;

    /// Persist changes to an existing user and its refresh tokens
    async fn update(&self, user: &User) -> Result<()>;
}

/// Generic CRUD repository for catalog records
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Records ordered by creation time, oldest first
    async fn list(&self, page: Page) -> Result<Vec<T>>;

    async fn get(&self, id: Uuid) -> Result<Option<T>>;

    async fn insert(&self, item: &T) -> Result<()>;

    /// Fails with `CoreError::NotFound` when the record does not exist
    async fn update(&self, item: &T) -> Result<()>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait BeanRepository: Repository<Bean> {
    /// Whether any bean references the origin
    async fn any_with_origin(&self, origin_id: Uuid) -> Result<bool>;

    /// Drop a tag from every bean carrying it
    async fn remove_tag(&self, tag_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait TagRepository: Repository<Tag> {
    /// Case-insensitive lookup
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;
}

#[async_trait]
pub trait ReviewRepository: Repository<Review> {
    async fn list_for_bean(&self, bean_id: Uuid, page: Page) -> Result<Vec<Review>>;

    /// Returns the number of reviews removed
    async fn delete_for_bean(&self, bean_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait UserListRepository: Repository<UserList> {
    async fn list_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<UserList>>;

    /// Drop a bean from every list containing it
    async fn remove_bean_everywhere(&self, bean_id: Uuid) -> Result<()>;
}

/// Bundle of catalog repository handles
#[derive(Clone)]
pub struct Catalog {
    pub beans: Arc<dyn BeanRepository>,
    pub origins: Arc<dyn Repository<Origin>>,
    pub tags: Arc<dyn TagRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub lists: Arc<dyn UserListRepository>,
}

impl Catalog {
    /// Catalog backed by process memory
    pub fn in_memory() -> Self {
        Self {
            beans: Arc::new(InMemoryRepository::<Bean>::new()),
            origins: Arc::new(InMemoryRepository::<Origin>::new()),
            tags: Arc::new(InMemoryRepository::<Tag>::new()),
            reviews: Arc::new(InMemoryRepository::<Review>::new()),
            lists: Arc::new(InMemoryRepository::<UserList>::new()),
        }
    }

    /// Catalog backed by PostgreSQL
    pub fn postgres(store: Arc<PgStore>) -> Self {
        Self {
            beans: store.clone(),
            origins: store.clone(),
            tags: store.clone(),
            reviews: store.clone(),
            lists: store,
        }
    }
}

/// Convenience constructor for the in-memory user store
pub fn in_memory_users() -> Arc<dyn UserStore> {
    Arc::new(InMemoryUserStore::new())
}
