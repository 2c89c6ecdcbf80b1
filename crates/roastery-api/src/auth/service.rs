//! Authentication service layer
//!
//! Registration, login, token refresh with rotation, refresh token revocation
//! and current-user lookup over a [`UserStore`] handle.

use chrono::Utc;
use roastery_core::{CoreError, User, UserStore};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};
use super::models::{AuthResponse, UserInfo};
use super::password::{
    generate_salt, hash_password, verify_dummy_password, verify_password, PasswordError,
};
use crate::audit::{audit_log, AuditEvent};
use crate::operation::{track, OperationMeta};

const REGISTER: OperationMeta = OperationMeta::command("auth.register");
const LOGIN: OperationMeta = OperationMeta::command("auth.login");
const REFRESH: OperationMeta = OperationMeta::command("auth.refresh");
const REVOKE: OperationMeta = OperationMeta::command("auth.revoke");
const CURRENT_USER: OperationMeta = OperationMeta::query("auth.current_user");

/// Revocation reason recorded when the caller gives none
pub const DEFAULT_REVOKE_REASON: &str = "Revoked without replacement";

/// Revocation reason recorded on rotation
pub const ROTATION_REASON: &str = "Replaced by new token";

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error(transparent)]
    Store(#[from] CoreError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Input for [`AuthService::register`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Token issuer used by this service
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new user and sign them in
    ///
    /// Username and email uniqueness are both checked before anything is written.
    pub async fn register(&self, new_user: NewUser) -> Result<AuthResponse, AuthError> {
        track(REGISTER, async {
            if self.users.username_exists(&new_user.username).await? {
                audit_log(&AuditEvent::RegistrationFailure {
                    username: new_user.username.clone(),
                    reason: "username taken".to_string(),
                });
                return Err(AuthError::UsernameTaken);
            }

            if self.users.email_exists(&new_user.email).await? {
                audit_log(&AuditEvent::RegistrationFailure {
                    username: new_user.username.clone(),
                    reason: "email taken".to_string(),
                });
                return Err(AuthError::EmailTaken);
            }

            let salt = generate_salt();
            let password_hash = hash_password(&new_user.password, &salt)?;

            let mut user = User::new(
                new_user.username,
                new_user.email,
                password_hash,
                salt,
                new_user.first_name,
                new_user.last_name,
            );

            // A concurrent registration can still win the race; the store reports it as a conflict
            self.users.insert(&user).await.map_err(|e| match e {
                CoreError::Conflict(msg) if msg.contains("email") => AuthError::EmailTaken,
                CoreError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Store(other),
            })?;

            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
            });

            let refresh_token = self.tokens.generate_refresh_token(user.id);
            self.issue_auth_response(&mut user, refresh_token).await
        })
        .await
    }

    /// Authenticate with username and password
    ///
    /// Unknown user, missing salt and wrong password all yield `InvalidCredentials`
    /// after one password MAC.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AuthError> {
        track(LOGIN, async {
            let Some(mut user) = self.users.find_by_username(username).await? else {
                verify_dummy_password(password);
                audit_log(&AuditEvent::LoginFailure {
                    username: username.to_string(),
                    reason: "unknown user".to_string(),
                });
                return Err(AuthError::InvalidCredentials);
            };

            let verified = match user.password_salt.as_deref() {
                Some(salt) => verify_password(password, &user.password_hash, salt),
                None => {
                    verify_dummy_password(password);
                    false
                }
            };

            if !verified {
                audit_log(&AuditEvent::LoginFailure {
                    username: username.to_string(),
                    reason: "password mismatch".to_string(),
                });
                return Err(AuthError::InvalidCredentials);
            }

            let now = Utc::now();
            user.last_login_at = Some(now);
            user.updated_at = now;

            audit_log(&AuditEvent::LoginSuccess {
                user_id: user.id,
                username: user.username.clone(),
            });

            let refresh_token = self.tokens.generate_refresh_token(user.id);
            self.issue_auth_response(&mut user, refresh_token).await
        })
        .await
    }

    /// Exchange an expired access token and an active refresh token for a new pair
    ///
    /// The consumed refresh token is revoked and linked to its replacement.
    pub async fn refresh_token(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthResponse, AuthError> {
        track(REFRESH, async {
            let claims = self.tokens.validate_expired_token(access_token).map_err(|e| {
                audit_log(&AuditEvent::TokenRefreshFailure {
                    reason: e.to_string(),
                });
                AuthError::InvalidToken
            })?;

            let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;
            let mut user = self
                .users
                .find_by_id(user_id)
                .await?
                .ok_or(AuthError::InvalidToken)?;

            let new_token = self.tokens.generate_refresh_token(user.id);

            match user.refresh_token_mut(refresh_token) {
                Some(existing) if existing.is_active() => {
                    existing.revoke(ROTATION_REASON, Some(new_token.token.clone()));
                }
                _ => {
                    audit_log(&AuditEvent::TokenRefreshFailure {
                        reason: "refresh token not active".to_string(),
                    });
                    return Err(AuthError::InvalidRefreshToken);
                }
            }

            audit_log(&AuditEvent::TokenRefresh { user_id: user.id });

            self.issue_auth_response(&mut user, new_token).await
        })
        .await
    }

    /// Revoke one of a user's refresh tokens
    ///
    /// Returns false when the user or token is unknown, or the token is no
    /// longer active.
    pub async fn revoke_token(
        &self,
        refresh_token: &str,
        user_id: Uuid,
        reason: Option<&str>,
    ) -> Result<bool, AuthError> {
        track(REVOKE, async {
            let Some(mut user) = self.users.find_by_id(user_id).await? else {
                return Ok(false);
            };

            let reason = reason.unwrap_or(DEFAULT_REVOKE_REASON);

            let revoked = match user.refresh_token_mut(refresh_token) {
                Some(token) if token.is_active() => {
                    token.revoke(reason, None);
                    true
                }
                _ => false,
            };

            if revoked {
                user.updated_at = Utc::now();
                self.users.update(&user).await?;
            }

            audit_log(&AuditEvent::TokenRevoked {
                user_id,
                revoked,
                reason: reason.to_string(),
            });

            Ok(revoked)
        })
        .await
    }

    /// Public profile of a user
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserInfo, AuthError> {
        track(CURRENT_USER, async {
            let user = self
                .users
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
            Ok(UserInfo::from(&user))
        })
        .await
    }

    async fn issue_auth_response(
        &self,
        user: &mut User,
        refresh_token: roastery_core::RefreshToken,
    ) -> Result<AuthResponse, AuthError> {
        let access = self.tokens.generate_access_token(user)?;
        let refresh_value = refresh_token.token.clone();

        user.refresh_tokens.push(refresh_token);
        self.users.update(user).await?;

        Ok(AuthResponse {
            token: access.token,
            refresh_token: refresh_value,
            expires_at: access.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use roastery_core::{AuthConfig, InMemoryUserStore};

    fn service() -> (AuthService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        let config = AuthConfig {
            jwt_secret: "unit-test-signing-key".to_string(),
            ..Default::default()
        };
        let tokens = TokenIssuer::new(&config).unwrap();
        (AuthService::new(store.clone(), tokens), store)
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "password123".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_login_scenario() {
        let (auth, _) = service();

        let registered = auth.register(alice()).await.unwrap();
        assert!(!registered.token.is_empty());
        assert!(!registered.refresh_token.is_empty());
        let expected = Utc::now() + Duration::minutes(15);
        assert!((registered.expires_at - expected).num_seconds().abs() <= 5);

        let wrong = auth.login("alice", "wrong").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let logged_in = auth.login("alice", "password123").await.unwrap();
        assert_ne!(logged_in.refresh_token, registered.refresh_token);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let (auth, _) = service();
        auth.register(alice()).await.unwrap();

        let unknown = auth.login("nobody", "password123").await.unwrap_err();
        let wrong = auth.login("alice", "password124").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_sets_last_login() {
        let (auth, store) = service();
        auth.register(alice()).await.unwrap();
        auth.login("alice", "password123").await.unwrap();

        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert!(user.last_login_at.is_some());
        assert_eq!(user.refresh_tokens.len(), 2);
    }

    #[tokio::test]
    async fn test_user_without_salt_cannot_login() {
        let (auth, store) = service();
        auth.register(alice()).await.unwrap();

        let mut user = store.find_by_username("alice").await.unwrap().unwrap();
        user.password_salt = None;
        store.update(&user).await.unwrap();

        let result = auth.login("alice", "password123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let (auth, store) = service();
        auth.register(alice()).await.unwrap();

        let same_name = NewUser {
            email: "other@x.com".to_string(),
            ..alice()
        };
        assert!(matches!(
            auth.register(same_name).await,
            Err(AuthError::UsernameTaken)
        ));

        let same_email = NewUser {
            username: "alice2".to_string(),
            email: "ALICE@X.COM".to_string(),
            ..alice()
        };
        assert!(matches!(
            auth.register(same_email).await,
            Err(AuthError::EmailTaken)
        ));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_rotation() {
        let (auth, store) = service();
        let first = auth.register(alice()).await.unwrap();

        let second = auth
            .refresh_token(&first.token, &first.refresh_token)
            .await
            .unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        let user = store.find_by_username("alice").await.unwrap().unwrap();
        let old = user.refresh_token(&first.refresh_token).unwrap();
        assert!(old.is_revoked());
        assert_eq!(old.revoked_reason.as_deref(), Some(ROTATION_REASON));
        assert_eq!(old.replaced_by_token.as_deref(), Some(second.refresh_token.as_str()));
        assert!(user.refresh_token(&second.refresh_token).unwrap().is_active());

        let reuse = auth.refresh_token(&second.token, &first.refresh_token).await;
        assert!(matches!(reuse, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_bad_access_token() {
        let (auth, _) = service();
        let first = auth.register(alice()).await.unwrap();

        let result = auth.refresh_token("not-a-jwt", &first.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_refresh_token() {
        let (auth, _) = service();
        let first = auth.register(alice()).await.unwrap();

        let result = auth.refresh_token(&first.token, "unknown").await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_expired_refresh_token() {
        let (auth, store) = service();
        let first = auth.register(alice()).await.unwrap();

        let mut user = store.find_by_username("alice").await.unwrap().unwrap();
        user.refresh_token_mut(&first.refresh_token).unwrap().expires_at =
            Utc::now() - Duration::seconds(1);
        store.update(&user).await.unwrap();

        let result = auth.refresh_token(&first.token, &first.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (auth, store) = service();
        let first = auth.register(alice()).await.unwrap();
        let user_id = store.find_by_username("alice").await.unwrap().unwrap().id;

        assert!(auth
            .revoke_token(&first.refresh_token, user_id, None)
            .await
            .unwrap());
        assert!(!auth
            .revoke_token(&first.refresh_token, user_id, None)
            .await
            .unwrap());

        let user = store.find_by_id(user_id).await.unwrap().unwrap();
        let token = user.refresh_token(&first.refresh_token).unwrap();
        assert_eq!(token.revoked_reason.as_deref(), Some(DEFAULT_REVOKE_REASON));
        assert!(token.replaced_by_token.is_none());

        let result = auth.refresh_token(&first.token, &first.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_revoke_unknown_user_or_token() {
        let (auth, store) = service();
        let first = auth.register(alice()).await.unwrap();
        let user_id = store.find_by_username("alice").await.unwrap().unwrap().id;

        assert!(!auth
            .revoke_token(&first.refresh_token, Uuid::new_v4(), None)
            .await
            .unwrap());
        assert!(!auth.revoke_token("missing", user_id, Some("lost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_current_user() {
        let (auth, store) = service();
        auth.register(alice()).await.unwrap();
        let user_id = store.find_by_username("alice").await.unwrap().unwrap().id;

        let info = auth.current_user(user_id).await.unwrap();
        assert_eq!(info.username, "alice");

        let missing = auth.current_user(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AuthError::Store(CoreError::NotFound(_)))));
    }
}
