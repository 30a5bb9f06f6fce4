use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::domain::ItemId;

/// Upper bound on ids accepted by one bulk request.
pub const MAX_BULK_IDS: usize = 1000;

/// JSON body extractor that reports malformed or incomplete bodies as a
/// `400` in the standard error envelope.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_to_error(&rejection)),
        }
    }
}

fn json_rejection_to_error(rejection: &JsonRejection) -> ApiError {
    ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// `{id}` path segment parsed and checked as an [`ItemId`]. Non-numeric and
/// non-positive ids are reported as a `400` in the standard error envelope.
#[derive(Debug)]
pub struct ItemIdPath(pub ItemId);

impl<S> FromRequestParts<S> for ItemIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::validation(format!("Invalid item ID: {}", rejection.body_text()))
            })?;
        validate_item_id(id).map(Self)
    }
}

pub fn validate_item_id(id: i32) -> Result<ItemId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid item ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(ItemId::new(id))
}

/// Validates a bulk id list and drops duplicates, keeping first occurrence.
pub fn validate_item_ids(ids: &[i32]) -> Result<Vec<ItemId>, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }

    if ids.len() > MAX_BULK_IDS {
        return Err(ApiError::validation(format!(
            "Too many ids: {}. At most {MAX_BULK_IDS} per request",
            ids.len()
        )));
    }

    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        let id = validate_item_id(id)?;
        if seen.insert(id) {
            out.push(id);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_id() {
        assert_eq!(validate_item_id(1).unwrap(), ItemId::new(1));
        assert!(validate_item_id(0).is_err());
        assert!(validate_item_id(-5).is_err());
    }

    #[test]
    fn test_validate_item_ids() {
        let ids = validate_item_ids(&[3, 1, 3, 2]).unwrap();
        assert_eq!(ids, vec![ItemId::new(3), ItemId::new(1), ItemId::new(2)]);

        assert!(validate_item_ids(&[]).is_err());
        assert!(validate_item_ids(&[1, 0]).is_err());

        let too_many: Vec<i32> = (1..=1001).collect();
        assert!(validate_item_ids(&too_many).is_err());
    }
}
