//! PostgreSQL store
//!
//! Implements the credential store and the catalog repositories using SQLx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{Bean, Origin, Page, RefreshToken, Review, Tag, User, UserList};
use crate::store::{
    BeanRepository, Repository, ReviewRepository, TagRepository, UserListRepository, UserStore,
};
use crate::{CoreError, Result};

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using the database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| CoreError::ConfigError("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Migration failed: {e}")))?;

        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn load_user(&self, row: Option<UserRow>) -> Result<Option<User>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let tokens: Vec<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, token, created_at, expires_at, revoked_at, revoked_reason, replaced_by_token
            FROM refresh_tokens
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut user = row.into_user()?;
        user.refresh_tokens = tokens.into_iter().map(RefreshToken::from).collect();
        Ok(Some(user))
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, password_salt, first_name, \
     last_name, bio, role, created_at, updated_at, last_login_at";

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    password_salt: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role = self
            .role
            .parse()
            .map_err(|_| CoreError::DatabaseError(format!("invalid role in database: {}", self.role)))?;

        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            password_salt: self.password_salt,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
            refresh_tokens: Vec::new(),
        })
    }
}

/// Refresh token row from database
#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    revoked_reason: Option<String>,
    replaced_by_token: Option<String>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshToken {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
            revoked_reason: row.revoked_reason,
            replaced_by_token: row.replaced_by_token,
        }
    }
}

async fn upsert_tokens(tx: &mut Transaction<'_, Postgres>, tokens: &[RefreshToken]) -> Result<()> {
    for token in tokens {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id, user_id, token, created_at, expires_at,
                revoked_at, revoked_reason, replaced_by_token
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                revoked_at = EXCLUDED.revoked_at,
                revoked_reason = EXCLUDED.revoked_reason,
                replaced_by_token = EXCLUDED.replaced_by_token
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(&token.revoked_reason)
        .bind(&token.replaced_by_token)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        self.load_user(row).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        self.load_user(row).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, password_salt,
                first_name, last_name, bio, role,
                created_at, updated_at, last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&mut *tx)
        .await?;

        upsert_tokens(&mut tx, &user.refresh_tokens).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $2, email = $3, password_hash = $4, password_salt = $5,
                first_name = $6, last_name = $7, bio = $8, role = $9,
                updated_at = $10, last_login_at = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("user {}", user.id)));
        }

        upsert_tokens(&mut tx, &user.refresh_tokens).await?;
        tx.commit().await?;
        Ok(())
    }
}

fn window(page: Page) -> (i64, i64) {
    (page.limit() as i64, page.offset() as i64)
}

fn ensure_updated(rows: u64, kind: &str, id: Uuid) -> Result<()> {
    if rows == 0 {
        Err(CoreError::NotFound(format!("{kind} {id}")))
    } else {
        Ok(())
    }
}

// ============================================================================
// Origins
// ============================================================================

#[derive(Debug, FromRow)]
struct OriginRow {
    id: Uuid,
    country: String,
    region: Option<String>,
    farm: Option<String>,
    altitude_m: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OriginRow> for Origin {
    fn from(row: OriginRow) -> Self {
        Origin {
            id: row.id,
            country: row.country,
            region: row.region,
            farm: row.farm,
            altitude_m: row.altitude_m,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl Repository<Origin> for PgStore {
    async fn list(&self, page: Page) -> Result<Vec<Origin>> {
        let (limit, offset) = window(page);
        let rows: Vec<OriginRow> = sqlx::query_as(
            "SELECT * FROM origins ORDER BY created_at, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Origin::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Origin>> {
        let row: Option<OriginRow> = sqlx::query_as("SELECT * FROM origins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Origin::from))
    }

    async fn insert(&self, item: &Origin) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO origins (id, country, region, farm, altitude_m, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(&item.country)
        .bind(&item.region)
        .bind(&item.farm)
        .bind(item.altitude_m)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: &Origin) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE origins SET country = $2, region = $3, farm = $4, altitude_m = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.country)
        .bind(&item.region)
        .bind(&item.farm)
        .bind(item.altitude_m)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "origin", item.id)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM origins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl Repository<Tag> for PgStore {
    async fn list(&self, page: Page) -> Result<Vec<Tag>> {
        let (limit, offset) = window(page);
        let rows: Vec<TagRow> =
            sqlx::query_as("SELECT * FROM tags ORDER BY created_at, id LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let row: Option<TagRow> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Tag::from))
    }

    async fn insert(&self, item: &Tag) -> Result<()> {
        sqlx::query("INSERT INTO tags (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)")
            .bind(item.id)
            .bind(&item.name)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, item: &Tag) -> Result<()> {
        let result = sqlx::query("UPDATE tags SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(item.id)
            .bind(&item.name)
            .bind(item.updated_at)
            .execute(&self.pool)
            .await?;
        ensure_updated(result.rows_affected(), "tag", item.id)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TagRepository for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row: Option<TagRow> = sqlx::query_as("SELECT * FROM tags WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Tag::from))
    }
}

// ============================================================================
// Beans
// ============================================================================

#[derive(Debug, FromRow)]
struct BeanRow {
    id: Uuid,
    name: String,
    roaster: String,
    origin_id: Option<Uuid>,
    roast_level: String,
    process: Option<String>,
    tasting_notes: Option<String>,
    tag_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BeanRow> for Bean {
    type Error = CoreError;

    fn try_from(row: BeanRow) -> Result<Self> {
        Ok(Bean {
            id: row.id,
            name: row.name,
            roaster: row.roaster,
            origin_id: row.origin_id,
            roast_level: row.roast_level.parse()?,
            process: row.process,
            tasting_notes: row.tasting_notes,
            tag_ids: row.tag_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl Repository<Bean> for PgStore {
    async fn list(&self, page: Page) -> Result<Vec<Bean>> {
        let (limit, offset) = window(page);
        let rows: Vec<BeanRow> =
            sqlx::query_as("SELECT * FROM beans ORDER BY created_at, id LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Bean::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Bean>> {
        let row: Option<BeanRow> = sqlx::query_as("SELECT * FROM beans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Bean::try_from).transpose()
    }

    async fn insert(&self, item: &Bean) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO beans (
                id, name, roaster, origin_id, roast_level, process,
                tasting_notes, tag_ids, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.roaster)
        .bind(item.origin_id)
        .bind(item.roast_level.as_str())
        .bind(&item.process)
        .bind(&item.tasting_notes)
        .bind(&item.tag_ids)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: &Bean) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE beans SET
                name = $2, roaster = $3, origin_id = $4, roast_level = $5,
                process = $6, tasting_notes = $7, tag_ids = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.roaster)
        .bind(item.origin_id)
        .bind(item.roast_level.as_str())
        .bind(&item.process)
        .bind(&item.tasting_notes)
        .bind(&item.tag_ids)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "bean", item.id)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM beans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BeanRepository for PgStore {
    async fn any_with_origin(&self, origin_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM beans WHERE origin_id = $1)")
                .bind(origin_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn remove_tag(&self, tag_id: Uuid) -> Result<()> {
        // Tag references live in an array column, so there is no FK to cascade
        sqlx::query("UPDATE beans SET tag_ids = array_remove(tag_ids, $1) WHERE $1 = ANY(tag_ids)")
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: Uuid,
    bean_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: Option<String>,
    brew_method: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Result<Review> {
        let rating = u8::try_from(self.rating).map_err(|_| {
            CoreError::DatabaseError(format!("invalid rating in database: {}", self.rating))
        })?;

        Ok(Review {
            id: self.id,
            bean_id: self.bean_id,
            user_id: self.user_id,
            rating,
            comment: self.comment,
            brew_method: self.brew_method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl Repository<Review> for PgStore {
    async fn list(&self, page: Page) -> Result<Vec<Review>> {
        let (limit, offset) = window(page);
        let rows: Vec<ReviewRow> =
            sqlx::query_as("SELECT * FROM reviews ORDER BY created_at, id LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(ReviewRow::into_review).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ReviewRow::into_review).transpose()
    }

    async fn insert(&self, item: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, bean_id, user_id, rating, comment, brew_method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id)
        .bind(item.bean_id)
        .bind(item.user_id)
        .bind(i16::from(item.rating))
        .bind(&item.comment)
        .bind(&item.brew_method)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: &Review) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE reviews SET rating = $2, comment = $3, brew_method = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(i16::from(item.rating))
        .bind(&item.comment)
        .bind(&item.brew_method)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "review", item.id)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn list_for_bean(&self, bean_id: Uuid, page: Page) -> Result<Vec<Review>> {
        let (limit, offset) = window(page);
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT * FROM reviews WHERE bean_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3",
        )
        .bind(bean_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ReviewRow::into_review).collect()
    }

    async fn delete_for_bean(&self, bean_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE bean_id = $1")
            .bind(bean_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// User lists
// ============================================================================

#[derive(Debug, FromRow)]
struct UserListRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    is_public: bool,
    bean_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserListRow> for UserList {
    fn from(row: UserListRow) -> Self {
        UserList {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            is_public: row.is_public,
            bean_ids: row.bean_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl Repository<UserList> for PgStore {
    async fn list(&self, page: Page) -> Result<Vec<UserList>> {
        let (limit, offset) = window(page);
        let rows: Vec<UserListRow> =
            sqlx::query_as("SELECT * FROM user_lists ORDER BY created_at, id LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(UserList::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserList>> {
        let row: Option<UserListRow> = sqlx::query_as("SELECT * FROM user_lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserList::from))
    }

    async fn insert(&self, item: &UserList) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_lists (id, user_id, name, description, is_public, bean_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id)
        .bind(item.user_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.is_public)
        .bind(&item.bean_ids)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: &UserList) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_lists SET
                name = $2, description = $3, is_public = $4, bean_ids = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.is_public)
        .bind(&item.bean_ids)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "list", item.id)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserListRepository for PgStore {
    async fn list_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<UserList>> {
        let (limit, offset) = window(page);
        let rows: Vec<UserListRow> = sqlx::query_as(
            "SELECT * FROM user_lists WHERE user_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserList::from).collect())
    }

    async fn remove_bean_everywhere(&self, bean_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE user_lists SET bean_ids = array_remove(bean_ids, $1), updated_at = NOW() \
             WHERE $1 = ANY(bean_ids)",
        )
        .bind(bean_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
