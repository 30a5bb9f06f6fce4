use crate::domain::{ItemId, ItemStatus, UserId};
use crate::entities::{items, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use serde::Serialize;
use tracing::debug;

/// A requisition item as exposed to the service layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub amount: f64,
    pub quantity: i32,
    pub status: ItemStatus,
    pub owner_id: UserId,
    pub created_at: String,
    pub updated_at: String,
}

/// Field changes for a partial update. `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub quantity: Option<i32>,
}

impl ItemPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none() && self.quantity.is_none()
    }
}

pub struct ItemRepository {
    conn: DatabaseConnection,
}

impl ItemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: items::Model) -> Item {
        Item {
            id: ItemId::new(m.id),
            title: m.title,
            amount: m.amount,
            quantity: m.quantity,
            status: m.status,
            owner_id: UserId::new(m.owner_id),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn ids_to_values(ids: &[ItemId]) -> Vec<i32> {
        ids.iter().map(ItemId::value).collect()
    }

    /// Inserts a new item. Status is always [`ItemStatus::Pending`].
    pub async fn insert(
        &self,
        owner: UserId,
        title: &str,
        amount: f64,
        quantity: i32,
    ) -> Result<Item> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = items::ActiveModel {
            title: Set(title.to_string()),
            amount: Set(amount),
            quantity: Set(quantity),
            status: Set(ItemStatus::Pending),
            owner_id: Set(owner.value()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert item")?;

        Ok(Self::map_model(model))
    }

    /// Every item, newest first.
    pub async fn list_all(&self) -> Result<Vec<Item>> {
        let rows = Items::find()
            .order_by_desc(items::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: ItemId) -> Result<Option<Item>> {
        let row = Items::find_by_id(id.value()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    /// Read-modify-write of the supplied fields. Returns `None` when the item
    /// does not exist.
    pub async fn update_fields(&self, id: ItemId, patch: ItemPatch) -> Result<Option<Item>> {
        let Some(model) = Items::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: items::ActiveModel = model.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update item fields")?;

        Ok(Some(Self::map_model(updated)))
    }

    /// Overwrites the status of one item. Returns `None` when the item does
    /// not exist.
    pub async fn update_status(&self, id: ItemId, status: ItemStatus) -> Result<Option<Item>> {
        let Some(model) = Items::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: items::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update item status")?;

        Ok(Some(Self::map_model(updated)))
    }

    /// Sets `status` on those of `ids` that are still pending. Decided rows
    /// are skipped. Returns the number of rows changed.
    pub async fn update_pending_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<u64> {
        let result = Items::update_many()
            .col_expr(items::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                items::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(items::Column::Id.is_in(Self::ids_to_values(ids)))
            .filter(items::Column::Status.eq(ItemStatus::Pending))
            .exec(&self.conn)
            .await
            .context("Failed to bulk update item status")?;

        debug!(
            requested = ids.len(),
            updated = result.rows_affected,
            status = %status,
            "Bulk status update applied"
        );
        Ok(result.rows_affected)
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: ItemId) -> Result<bool> {
        let result = Items::delete_by_id(id.value()).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_many(&self, ids: &[ItemId]) -> Result<u64> {
        let result = Items::delete_many()
            .filter(items::Column::Id.is_in(Self::ids_to_values(ids)))
            .exec(&self.conn)
            .await
            .context("Failed to bulk delete items")?;

        Ok(result.rows_affected)
    }

    /// Deletes those of `ids` owned by `owner`; other owners' rows are left.
    pub async fn delete_many_owned(&self, ids: &[ItemId], owner: UserId) -> Result<u64> {
        let result = Items::delete_many()
            .filter(items::Column::Id.is_in(Self::ids_to_values(ids)))
            .filter(items::Column::OwnerId.eq(owner.value()))
            .exec(&self.conn)
            .await
            .context("Failed to bulk delete owned items")?;

        Ok(result.rows_affected)
    }

    /// Item counts per status for one owner. Statuses with no rows are absent.
    pub async fn count_by_status(&self, owner: UserId) -> Result<Vec<(ItemStatus, i64)>> {
        let rows: Vec<(String, i64)> = Items::find()
            .select_only()
            .column(items::Column::Status)
            .column_as(Expr::col(items::Column::Id).count(), "count")
            .filter(items::Column::OwnerId.eq(owner.value()))
            .group_by(items::Column::Status)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count items by status")?;

        rows.into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<ItemStatus>()
                    .map_err(|e| anyhow::anyhow!(e))?;
                Ok((status, count))
            })
            .collect()
    }
}
