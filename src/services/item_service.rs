//! Domain service for requisition items.
//!
//! Holds the item lifecycle rules: creation always starts pending, bulk status
//! changes only touch pending rows, and bulk deletion is owner-scoped unless
//! the caller is an admin.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::db::{Item, ItemPatch};
use crate::domain::{Caller, ItemId, ItemStatus, UserId};

pub const MAX_TITLE_LEN: usize = 255;

/// Item counts keyed by status. Every status is present.
pub type StatusCounts = BTreeMap<ItemStatus, i64>;

/// Errors specific to item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ItemError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Fields of a new item. Status and owner are not caller-controlled.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub amount: f64,
    pub quantity: i32,
}

/// Domain service trait for items.
#[async_trait::async_trait]
pub trait ItemService: Send + Sync {
    /// Creates a pending item owned by the caller.
    async fn create(&self, caller: &Caller, item: NewItem) -> Result<Item, ItemError>;

    /// Every item, newest first.
    async fn find_all(&self) -> Result<Vec<Item>, ItemError>;

    async fn find_by_id(&self, id: ItemId) -> Result<Item, ItemError>;

    /// Overwrites only the supplied fields; status is never touched.
    async fn update_fields(&self, id: ItemId, patch: ItemPatch) -> Result<Item, ItemError>;

    /// Sets the status of a single item, subject to the transition policy.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::InvalidTransition`] when strict transitions are
    /// enabled and the change is not allowed.
    async fn update_status(&self, id: ItemId, status: ItemStatus) -> Result<Item, ItemError>;

    /// Sets `status` on the pending items among `ids`. Returns how many rows
    /// changed; decided items are skipped silently.
    async fn update_many_status(
        &self,
        ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64, ItemError>;

    /// # Errors
    ///
    /// Returns [`ItemError::NotFound`] when no item has this id, including a
    /// second delete of the same id.
    async fn delete(&self, id: ItemId) -> Result<(), ItemError>;

    /// Deletes every item among `ids` regardless of owner.
    async fn delete_many(&self, ids: &[ItemId]) -> Result<u64, ItemError>;

    /// Deletes the caller's own items among `ids`, or all of them for an admin.
    async fn delete_many_for(&self, caller: &Caller, ids: &[ItemId]) -> Result<u64, ItemError>;

    async fn count_by_status_for_owner(&self, owner: UserId) -> Result<StatusCounts, ItemError>;
}
