use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::validation::JsonBody;
use super::{ApiError, ApiResponse, AppState, LoginRequest, RegisterResponse};
use crate::domain::Caller;
use crate::services::{LoginResult, Registration};

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>`. On success the verified
/// [`Caller`] is stored in the request extensions for handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        tracing::debug!("Rejected request without bearer token");
        return Err(ApiError::unauthorized());
    };

    let caller = state.auth_service().authenticate(token).map_err(|_| {
        tracing::debug!("Rejected request with invalid token");
        ApiError::unauthorized()
    })?;

    tracing::Span::current().record("user_id", caller.user_id.value());
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Layered inside [`auth_middleware`]; rejects non-admin callers with `403`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(caller) = request.extensions().get::<Caller>() else {
        return Err(ApiError::unauthorized());
    };

    if !caller.is_admin() {
        tracing::debug!(user_id = %caller.user_id, "Rejected non-admin caller");
        return Err(ApiError::admin_required());
    }

    Ok(next.run(request).await)
}

/// The scheme is matched case-insensitively. A bare token is rejected.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<Registration>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    let user = state.auth_service().register(payload).await?;

    Ok(Json(ApiResponse::success(RegisterResponse {
        message: "User registered".to_string(),
        user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("abc.def")), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
