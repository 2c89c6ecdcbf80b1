//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Salted password hashing (HMAC-SHA512)
//! - Access token generation and validation, refresh token minting
//! - Authentication service for registration, login, refresh and revocation
//! - Middleware for request authentication and role checks

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use jwt::{Claims, IssuedToken, JwtError, TokenIssuer};
pub use middleware::{
    auth_middleware, optional_auth_middleware, require_any_role, AccessError, AuthenticatedUser,
};
pub use models::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, RevokeRequest, UserInfo,
};
pub use password::{generate_salt, hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService, NewUser};
