//! JWT token generation and validation
//!
//! Access tokens are HS256-signed JWTs carrying the user's identity and role.
//! Refresh tokens are opaque random strings stored on the user aggregate.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use roastery_core::config::{MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS};
use roastery_core::{AuthConfig, ConfigError, RefreshToken, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Refresh token length in bytes before encoding
const REFRESH_TOKEN_LEN: usize = 64;

/// JWT Claims structure containing user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Intended audience
    pub aud: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - unique per token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Username
    pub name: String,
    /// User's email address
    pub email: String,
    /// User's role (user, brewer, admin)
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,
}

/// Access token as issued, with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates tokens with a fixed signing key
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from configuration
    ///
    /// An empty signing key or an out-of-range lifetime is a configuration error.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        let access_lifetime = lifetime(
            "JWT_ACCESS_TOKEN_MINUTES",
            config.access_token_minutes,
            MAX_ACCESS_TOKEN_MINUTES,
            Duration::try_minutes,
        )?;
        let refresh_lifetime = lifetime(
            "JWT_REFRESH_TOKEN_DAYS",
            config.refresh_token_days,
            MAX_REFRESH_TOKEN_DAYS,
            Duration::try_days,
        )?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_lifetime,
            refresh_lifetime,
        })
    }

    /// Access token lifetime
    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    /// Generate a signed access token for a user
    ///
    /// # Example
    ///
    /// ```no_run
    /// use roastery_api::auth::jwt::TokenIssuer;
    /// use roastery_core::{AuthConfig, User};
    ///
    /// let config = AuthConfig {
    ///     jwt_secret: "change-me".to_string(),
    ///     ..Default::default()
    /// };
    /// let issuer = TokenIssuer::new(&config).unwrap();
    /// let user = User::new(
    ///     "alice".to_string(),
    ///     "alice@example.com".to_string(),
    ///     "hash".to_string(),
    ///     "salt".to_string(),
    ///     None,
    ///     None,
    /// );
    /// let issued = issuer.generate_access_token(&user).unwrap();
    /// println!("expires at {}", issued.expires_at);
    /// ```
    pub fn generate_access_token(&self, user: &User) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expires_at = now + self.access_lifetime;

        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: user.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            name: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Generate a new opaque refresh token owned by `user_id`
    pub fn generate_refresh_token(&self, user_id: Uuid) -> RefreshToken {
        let mut bytes = [0u8; REFRESH_TOKEN_LEN];
        OsRng.fill_bytes(&mut bytes);

        RefreshToken::new(user_id, STANDARD.encode(bytes), Utc::now() + self.refresh_lifetime)
    }

    /// Fully validate a live access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            })
    }

    /// Decode a possibly expired access token
    ///
    /// The signature is checked and the header algorithm must be HS256;
    /// expiry, issuer and audience are ignored. Any failure is `InvalidToken`.
    pub fn validate_expired_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| JwtError::InvalidToken)
    }
}

/// Build a token lifetime that stays addressable from the current time
fn lifetime(
    key: &str,
    value: i64,
    max: i64,
    build: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    (1..=max)
        .contains(&value)
        .then(|| build(value))
        .flatten()
        .filter(|duration| Utc::now().checked_add_signed(*duration).is_some())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
