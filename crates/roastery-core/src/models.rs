//! Domain models for the catalog and for user accounts
//!
//! This module defines the core data structures:
//! - User: account information, credential material and owned refresh tokens
//! - RefreshToken: long-lived opaque tokens exchanged for new access tokens
//! - Bean, Origin, Tag: the coffee catalog
//! - Review, UserList: user-generated content referencing beans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

// ============================================================================
// Users
// ============================================================================

/// User role enum
///
/// Defines the access level for a user in the system:
/// - User: Can review beans and curate personal lists
/// - Brewer: Can additionally manage catalog entries
/// - Admin: Full access, including other users' content
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Brewer,
    Admin,
}

impl UserRole {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Brewer => "brewer",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "brewer" => Ok(UserRole::Brewer),
            "admin" => Ok(UserRole::Admin),
            _ => Err(CoreError::ValidationError(format!("unknown role: {s}"))),
        }
    }
}

/// User account
///
/// The user aggregate owns its refresh tokens; the credential store persists
/// both together. Credential material is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Unique email address (compared case-insensitively)
    pub email: String,

    /// Base64 HMAC-SHA512 of the password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Base64 salt; a user without one can never log in
    #[serde(skip_serializing)]
    pub password_salt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub refresh_tokens: Vec<RefreshToken>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        password_salt: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            password_salt: Some(password_salt),
            first_name,
            last_name,
            bio: None,
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
            refresh_tokens: Vec::new(),
        }
    }

    /// Find a refresh token by value, regardless of its state
    pub fn refresh_token(&self, token: &str) -> Option<&RefreshToken> {
        self.refresh_tokens.iter().find(|t| t.token == token)
    }

    /// Find a refresh token by value, regardless of its state
    pub fn refresh_token_mut(&mut self, token: &str) -> Option<&mut RefreshToken> {
        self.refresh_tokens.iter_mut().find(|t| t.token == token)
    }

    /// Tokens that can still be exchanged
    pub fn active_refresh_tokens(&self) -> impl Iterator<Item = &RefreshToken> {
        self.refresh_tokens.iter().filter(|t| t.is_active())
    }
}

/// Refresh token
///
/// Opaque random value owned by a user. Tokens are never deleted: revocation
/// only sets `revoked_at`, `revoked_reason` and optionally `replaced_by_token`,
/// which keeps the rotation chain auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_by_token: Option<String>,
}

impl RefreshToken {
    /// Create a new, active refresh token issued now
    pub fn new(user_id: Uuid, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
            revoked_reason: None,
            replaced_by_token: None,
        }
    }

    /// Expired once `now >= expires_at`
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Neither expired nor revoked
    pub fn is_active(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }

    /// Mark the token revoked now
    pub fn revoke(&mut self, reason: impl Into<String>, replaced_by: Option<String>) {
        self.revoked_at = Some(Utc::now());
        self.revoked_reason = Some(reason.into());
        self.replaced_by_token = replaced_by;
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Common behaviour of catalog records stored in a [`crate::Repository`]
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable entity name used in error messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;
}

/// Roast level of a bean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoastLevel {
    Light,
    #[default]
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "light",
            RoastLevel::Medium => "medium",
            RoastLevel::MediumDark => "medium-dark",
            RoastLevel::Dark => "dark",
        }
    }
}

impl std::fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoastLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(RoastLevel::Light),
            "medium" => Ok(RoastLevel::Medium),
            "medium-dark" | "medium_dark" => Ok(RoastLevel::MediumDark),
            "dark" => Ok(RoastLevel::Dark),
            _ => Err(CoreError::ValidationError(format!("unknown roast level: {s}"))),
        }
    }
}

/// Growing origin of a bean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub id: Uuid,
    pub country: String,
    pub region: Option<String>,
    pub farm: Option<String>,
    /// Altitude in metres above sea level
    pub altitude_m: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Origin {
    pub fn new(country: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            country,
            region: None,
            farm: None,
            altitude_m: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Free-form label attached to beans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Coffee bean offered by a roaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bean {
    pub id: Uuid,
    pub name: String,
    pub roaster: String,
    pub origin_id: Option<Uuid>,
    pub roast_level: RoastLevel,
    /// Processing method (washed, natural, honey, ...)
    pub process: Option<String>,
    pub tasting_notes: Option<String>,
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bean {
    pub fn new(name: String, roaster: String, roast_level: RoastLevel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            roaster,
            origin_id: None,
            roast_level,
            process: None,
            tasting_notes: None,
            tag_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's rating of a bean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub bean_id: Uuid,
    pub user_id: Uuid,
    /// 1 to 5
    pub rating: u8,
    pub comment: Option<String>,
    pub brew_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(bean_id: Uuid, user_id: Uuid, rating: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bean_id,
            user_id,
            rating,
            comment: None,
            brew_method: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Named collection of beans curated by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub bean_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserList {
    pub fn new(user_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            is_public: false,
            bean_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a bean; returns false if it was already present
    pub fn add_bean(&mut self, bean_id: Uuid) -> bool {
        if self.bean_ids.contains(&bean_id) {
            return false;
        }
        self.bean_ids.push(bean_id);
        self.updated_at = Utc::now();
        true
    }

    /// Remove a bean; returns false if it was not present
    pub fn remove_bean(&mut self, bean_id: Uuid) -> bool {
        let before = self.bean_ids.len();
        self.bean_ids.retain(|id| *id != bean_id);
        let removed = self.bean_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_entity!(Origin, "origin");
impl_entity!(Tag, "tag");
impl_entity!(Bean, "bean");
impl_entity!(Review, "review");
impl_entity!(UserList, "list");

/// Pagination window (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Build a page, clamping out-of-range values
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_role_conversion() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Brewer.as_str(), "brewer");
        assert_eq!(UserRole::User.as_str(), "user");

        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("BREWER".parse::<UserRole>().unwrap(), UserRole::Brewer);
        assert!("barista".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let user = User::new(
            "alice".to_string(),
            "alice@x.com".to_string(),
            "secret_hash".to_string(),
            "secret_salt".to_string(),
            None,
            None,
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret_hash"));
        assert!(!json.contains("secret_salt"));
        assert!(!json.contains("refreshTokens"));
        assert!(json.contains("createdAt"));
    }

    #[test]
    fn test_refresh_token_state() {
        let now = Utc::now();
        let mut token = RefreshToken::new(Uuid::new_v4(), "abc".to_string(), now + Duration::days(7));

        assert!(token.is_active());
        assert!(!token.is_expired());
        assert!(!token.is_revoked());

        token.expires_at = now - Duration::seconds(1);
        assert!(token.is_expired());
        assert!(!token.is_active());

        token.expires_at = now + Duration::days(7);
        token.revoke("Replaced by new token", Some("def".to_string()));
        assert!(token.is_revoked());
        assert!(!token.is_active());
        assert_eq!(token.revoked_reason.as_deref(), Some("Replaced by new token"));
        assert_eq!(token.replaced_by_token.as_deref(), Some("def"));
    }

    #[test]
    fn test_token_expiring_exactly_now_is_expired() {
        let mut token =
            RefreshToken::new(Uuid::new_v4(), "abc".to_string(), Utc::now() + Duration::days(1));
        token.expires_at = Utc::now();
        assert!(token.is_expired());
    }

    #[test]
    fn test_user_token_lookup() {
        let mut user = User::new(
            "bob".to_string(),
            "bob@x.com".to_string(),
            "h".to_string(),
            "s".to_string(),
            None,
            None,
        );
        let expires = Utc::now() + Duration::days(1);
        user.refresh_tokens.push(RefreshToken::new(user.id, "one".to_string(), expires));
        user.refresh_tokens.push(RefreshToken::new(user.id, "two".to_string(), expires));

        user.refresh_token_mut("one").unwrap().revoke("test", None);

        assert!(user.refresh_token("one").is_some());
        assert!(user.refresh_token("missing").is_none());
        assert_eq!(user.active_refresh_tokens().count(), 1);
    }

    #[test]
    fn test_roast_level_parse() {
        assert_eq!("medium-dark".parse::<RoastLevel>().unwrap(), RoastLevel::MediumDark);
        assert_eq!("DARK".parse::<RoastLevel>().unwrap(), RoastLevel::Dark);
        assert!("burnt".parse::<RoastLevel>().is_err());
        assert_eq!(
            serde_json::to_string(&RoastLevel::MediumDark).unwrap(),
            "\"medium-dark\""
        );
    }

    #[test]
    fn test_user_list_membership() {
        let mut list = UserList::new(Uuid::new_v4(), "Favourites".to_string());
        let bean = Uuid::new_v4();

        assert!(list.add_bean(bean));
        assert!(!list.add_bean(bean));
        assert_eq!(list.bean_ids.len(), 1);

        assert!(list.remove_bean(bean));
        assert!(!list.remove_bean(bean));
        assert!(list.bean_ids.is_empty());
    }

    #[test]
    fn test_page_clamping() {
        let page = Page::new(Some(0), Some(1000));
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, Page::MAX_SIZE);

        let page = Page::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);

        assert_eq!(Page::default().page_size, Page::DEFAULT_SIZE);
    }
}
