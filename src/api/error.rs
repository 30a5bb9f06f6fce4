use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, ItemError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid username or password".to_string())
            }
            AuthError::UsernameTaken => Self::Conflict("Username already taken".to_string()),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Forbidden(msg) => Self::Forbidden(msg),
            AuthError::Unauthorized => Self::unauthorized(),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ItemError> for ApiError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::NotFound(id) => Self::not_found("Item", id),
            ItemError::Validation(msg) => Self::ValidationError(msg),
            err @ ItemError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            ItemError::Database(msg) => Self::DatabaseError(msg),
            ItemError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Uniform rejection for a missing, malformed, badly signed or expired token.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Invalid or expired token".to_string())
    }

    #[must_use]
    pub fn admin_required() -> Self {
        Self::Forbidden("Admin role required".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, ItemStatus};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError::from(AuthError::UsernameTaken), StatusCode::CONFLICT),
            (ApiError::from(AuthError::Forbidden("x".into())), StatusCode::FORBIDDEN),
            (ApiError::from(ItemError::NotFound(ItemId::new(3))), StatusCode::NOT_FOUND),
            (ApiError::from(ItemError::Validation("x".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::from(ItemError::InvalidTransition {
                    from: ItemStatus::Approved,
                    to: ItemStatus::Pending,
                }),
                StatusCode::CONFLICT,
            ),
            (ApiError::admin_required(), StatusCode::FORBIDDEN),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_redacted() {
        use http_body_util::BodyExt;

        let err = ApiError::from(ItemError::Database(
            "no such table: items at /var/lib/secret.db".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("A database error occurred"));
        assert!(!text.contains("secret.db"));
    }
}
