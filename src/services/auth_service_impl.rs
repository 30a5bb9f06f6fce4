//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::db::{InsertOutcome, NewUser, Store, User};
use crate::domain::{Caller, Role};
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, MAX_PROFILE_FIELD_LEN, MAX_USERNAME_LEN, Registration,
};
use crate::services::token::TokenIssuer;
use async_trait::async_trait;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenIssuer>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenIssuer>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    async fn insert(&self, registration: Registration) -> Result<User, AuthError> {
        let new_user = normalize(registration)?;
        let username = new_user.username.clone();

        match self.store.insert_user(new_user, &self.security).await? {
            InsertOutcome::Created(user) => {
                info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(user)
            }
            InsertOutcome::UsernameTaken => {
                info!(username = %username, "Registration rejected: username taken");
                Err(AuthError::UsernameTaken)
            }
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if !self.security.allow_admin_registration
            && Role::from_position(registration.position.trim()).is_admin()
        {
            return Err(AuthError::Forbidden(
                "Admin accounts cannot be self-registered \
                 (security.allow_admin_registration is disabled)"
                    .to_string(),
            ));
        }

        self.insert(registration).await
    }

    async fn create_user(&self, registration: Registration) -> Result<User, AuthError> {
        self.insert(registration).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let Some(user) = self
            .store
            .verify_user_credentials(username, password)
            .await?
        else {
            warn!(username = %username, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        let issued = self.tokens.issue(&user)?;
        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginResult {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user,
        })
    }

    fn authenticate(&self, token: &str) -> Result<Caller, AuthError> {
        let claims = self.tokens.verify(token)?;
        Ok(Caller::from(claims))
    }
}

/// Trims and bounds the registration fields.
fn normalize(registration: Registration) -> Result<NewUser, AuthError> {
    let username = registration.username.trim().to_string();
    if username.is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if registration.password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }

    let first_name = registration.first_name.trim().to_string();
    let last_name = registration.last_name.trim().to_string();
    let position = registration.position.trim().to_string();

    for (field, value) in [
        ("first_name", &first_name),
        ("last_name", &last_name),
        ("position", &position),
    ] {
        if value.chars().count() > MAX_PROFILE_FIELD_LEN {
            return Err(AuthError::Validation(format!(
                "{field} must be at most {MAX_PROFILE_FIELD_LEN} characters"
            )));
        }
    }

    let photo_link = registration
        .photo_link
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty());

    Ok(NewUser {
        username,
        password: registration.password,
        first_name,
        last_name,
        position,
        photo_link,
    })
}
