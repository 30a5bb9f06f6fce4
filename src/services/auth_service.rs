//! Domain service for registration, login and bearer-token authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;
use crate::domain::Caller;
use crate::services::token::TokenError;

pub const MAX_USERNAME_LEN: usize = 255;
pub const MAX_PROFILE_FIELD_LEN: usize = 100;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username and wrong password are reported identically.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::Unauthorized,
            TokenError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Registration payload. Profile fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub photo_link: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a self-service account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] when the store's unique constraint
    /// rejects the username, and [`AuthError::Forbidden`] for an `admin`
    /// position while admin self-registration is disabled.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Provisions an account without the self-registration restrictions.
    async fn create_user(&self, registration: Registration) -> Result<User, AuthError>;

    /// Verifies credentials and issues an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token into the calling identity.
    fn authenticate(&self, token: &str) -> Result<Caller, AuthError>;
}
