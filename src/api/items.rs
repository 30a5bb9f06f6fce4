//! Item endpoints.
//!
//! Handlers only translate HTTP into [`ItemService`](crate::services::ItemService)
//! calls; the caller identity comes from the auth guard.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{ItemIdPath, JsonBody, validate_item_ids};
use super::{
    ApiError, ApiResponse, AppState, BulkDeleteRequest, BulkDeleteResponse, BulkStatusRequest,
    BulkUpdateResponse, CreateItemRequest, MessageResponse, UpdateItemRequest,
    UpdateStatusRequest,
};
use crate::db::Item;
use crate::domain::Caller;
use crate::services::StatusCounts;

/// POST /items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Item>>), ApiError> {
    let item = state.item_service().create(&caller, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// GET /items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Item>>>, ApiError> {
    let items = state.item_service().find_all().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ItemIdPath(id): ItemIdPath,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state.item_service().find_by_id(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// PUT /items/{id}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    ItemIdPath(id): ItemIdPath,
    JsonBody(payload): JsonBody<UpdateItemRequest>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state
        .item_service()
        .update_fields(id, payload.into())
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// PATCH /items/{id}
pub async fn update_item_status(
    State(state): State<Arc<AppState>>,
    ItemIdPath(id): ItemIdPath,
    JsonBody(payload): JsonBody<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state
        .item_service()
        .update_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// PATCH /items/update/status/many (admin)
pub async fn update_items_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<BulkStatusRequest>,
) -> Result<Json<ApiResponse<BulkUpdateResponse>>, ApiError> {
    let ids = validate_item_ids(&payload.ids)?;
    let updated = state
        .item_service()
        .update_many_status(&ids, payload.status)
        .await?;

    tracing::info!(
        admin_id = %caller.user_id,
        updated,
        status = %payload.status,
        "Admin bulk status update"
    );
    Ok(Json(ApiResponse::success(BulkUpdateResponse { updated })))
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    ItemIdPath(id): ItemIdPath,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.item_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Item {id} deleted"),
    })))
}

/// DELETE /items/delete/many
pub async fn delete_items(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteResponse>>, ApiError> {
    let ids = validate_item_ids(&payload.ids)?;
    let deleted = state.item_service().delete_many_for(&caller, &ids).await?;
    Ok(Json(ApiResponse::success(BulkDeleteResponse { deleted })))
}

/// GET /items/status/count/user
pub async fn count_items_by_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ApiResponse<StatusCounts>>, ApiError> {
    let counts = state
        .item_service()
        .count_by_status_for_owner(caller.user_id)
        .await?;
    Ok(Json(ApiResponse::success(counts)))
}
