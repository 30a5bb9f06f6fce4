//! `SeaORM` implementation of the `ItemService` trait.

use crate::db::{Item, ItemPatch, Store};
use crate::domain::{Caller, ItemId, ItemStatus, UserId};
use crate::services::item_service::{
    ItemError, ItemService, MAX_TITLE_LEN, NewItem, StatusCounts,
};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmItemService {
    store: Store,
    strict_transitions: bool,
}

impl SeaOrmItemService {
    #[must_use]
    pub const fn new(store: Store, strict_transitions: bool) -> Self {
        Self {
            store,
            strict_transitions,
        }
    }
}

#[async_trait]
impl ItemService for SeaOrmItemService {
    async fn create(&self, caller: &Caller, item: NewItem) -> Result<Item, ItemError> {
        let title = validate_title(&item.title)?;
        validate_amount(item.amount)?;
        validate_quantity(item.quantity)?;

        let created = self
            .store
            .add_item(caller.user_id, &title, item.amount, item.quantity)
            .await?;

        info!(item_id = %created.id, owner_id = %caller.user_id, "Item created");
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<Item>, ItemError> {
        Ok(self.store.list_items().await?)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Item, ItemError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    async fn update_fields(&self, id: ItemId, mut patch: ItemPatch) -> Result<Item, ItemError> {
        if patch.is_empty() {
            return Err(ItemError::Validation(
                "At least one of title, amount or quantity is required".to_string(),
            ));
        }
        if let Some(title) = &patch.title {
            patch.title = Some(validate_title(title)?);
        }
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
        }

        self.store
            .update_item_fields(id, patch)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    async fn update_status(&self, id: ItemId, status: ItemStatus) -> Result<Item, ItemError> {
        let current = self.find_by_id(id).await?;

        if !current
            .status
            .can_transition_to(status, self.strict_transitions)
        {
            return Err(ItemError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        self.store
            .update_item_status(id, status)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    async fn update_many_status(
        &self,
        ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64, ItemError> {
        require_ids(ids)?;

        let updated = self.store.update_pending_items_status(ids, status).await?;
        info!(
            requested = ids.len(),
            updated,
            status = %status,
            "Bulk status update"
        );
        Ok(updated)
    }

    async fn delete(&self, id: ItemId) -> Result<(), ItemError> {
        if self.store.delete_item(id).await? {
            info!(item_id = %id, "Item deleted");
            Ok(())
        } else {
            Err(ItemError::NotFound(id))
        }
    }

    async fn delete_many(&self, ids: &[ItemId]) -> Result<u64, ItemError> {
        require_ids(ids)?;
        Ok(self.store.delete_items(ids).await?)
    }

    async fn delete_many_for(&self, caller: &Caller, ids: &[ItemId]) -> Result<u64, ItemError> {
        require_ids(ids)?;

        let deleted = if caller.is_admin() {
            self.delete_many(ids).await?
        } else {
            self.store.delete_owned_items(ids, caller.user_id).await?
        };

        info!(
            caller_id = %caller.user_id,
            admin = caller.is_admin(),
            requested = ids.len(),
            deleted,
            "Bulk delete"
        );
        Ok(deleted)
    }

    async fn count_by_status_for_owner(&self, owner: UserId) -> Result<StatusCounts, ItemError> {
        let mut counts: StatusCounts = ItemStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for (status, count) in self.store.count_items_by_status(owner).await? {
            counts.insert(status, count);
        }
        Ok(counts)
    }
}

fn validate_title(title: &str) -> Result<String, ItemError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ItemError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ItemError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_amount(amount: f64) -> Result<(), ItemError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ItemError::Validation(
            "Amount must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> Result<(), ItemError> {
    if quantity < 1 {
        return Err(ItemError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn require_ids(ids: &[ItemId]) -> Result<(), ItemError> {
    if ids.is_empty() {
        return Err(ItemError::Validation("ids must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::{InsertOutcome, NewUser};
    use crate::domain::Role;

    struct Fixture {
        service: SeaOrmItemService,
        alice: Caller,
        bob: Caller,
        admin: Caller,
    }

    async fn caller(store: &Store, username: &str, position: &str) -> Caller {
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let new_user = NewUser {
            username: username.to_string(),
            password: "pw".to_string(),
            position: position.to_string(),
            ..NewUser::default()
        };
        let InsertOutcome::Created(user) = store.insert_user(new_user, &security).await.unwrap()
        else {
            panic!("user {username} already exists");
        };
        Caller {
            user_id: user.id,
            role: user.role(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            position: user.position,
            photo_link: user.photo_link,
        }
    }

    async fn fixture(strict_transitions: bool) -> Fixture {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let alice = caller(&store, "alice", "buyer").await;
        let bob = caller(&store, "bob", "buyer").await;
        let admin = caller(&store, "root", "admin").await;
        assert_eq!(admin.role, Role::Admin);

        Fixture {
            service: SeaOrmItemService::new(store, strict_transitions),
            alice,
            bob,
            admin,
        }
    }

    fn pen() -> NewItem {
        NewItem {
            title: "pen".to_string(),
            amount: 5.0,
            quantity: 10,
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending_and_owned() {
        let f = fixture(false).await;
        let item = f.service.create(&f.alice, pen()).await.unwrap();

        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.owner_id, f.alice.user_id);
        assert_eq!(f.service.find_by_id(item.id).await.unwrap(), item);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = fixture(false).await;
        for bad in [
            NewItem { title: "  ".to_string(), ..pen() },
            NewItem { amount: -1.0, ..pen() },
            NewItem { amount: f64::NAN, ..pen() },
            NewItem { quantity: 0, ..pen() },
        ] {
            assert!(matches!(
                f.service.create(&f.alice, bad).await,
                Err(ItemError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let f = fixture(false).await;
        let first = f.service.create(&f.alice, pen()).await.unwrap();
        let second = f.service.create(&f.bob, pen()).await.unwrap();

        let all = f.service.find_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let f = fixture(false).await;
        let item = f.service.create(&f.alice, pen()).await.unwrap();

        let patch = ItemPatch {
            amount: Some(7.5),
            ..ItemPatch::default()
        };
        let updated = f.service.update_fields(item.id, patch).await.unwrap();

        assert!((updated.amount - 7.5).abs() < f64::EPSILON);
        assert_eq!(updated.title, "pen");
        assert_eq!(updated.quantity, 10);
        assert_eq!(updated.status, ItemStatus::Pending);
        assert_eq!(updated.owner_id, item.owner_id);
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let f = fixture(false).await;
        let patch = ItemPatch {
            title: Some("x".to_string()),
            ..ItemPatch::default()
        };
        assert!(matches!(
            f.service.update_fields(ItemId::new(999), patch).await,
            Err(ItemError::NotFound(_))
        ));
        assert!(matches!(
            f.service.update_status(ItemId::new(999), ItemStatus::Approved).await,
            Err(ItemError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_permissive_status_update_reopens() {
        let f = fixture(false).await;
        let item = f.service.create(&f.alice, pen()).await.unwrap();

        f.service
            .update_status(item.id, ItemStatus::Approved)
            .await
            .unwrap();
        let reopened = f
            .service
            .update_status(item.id, ItemStatus::Pending)
            .await
            .unwrap();
        assert_eq!(reopened.status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn test_strict_status_update_blocks_reopen() {
        let f = fixture(true).await;
        let item = f.service.create(&f.alice, pen()).await.unwrap();

        f.service
            .update_status(item.id, ItemStatus::Approved)
            .await
            .unwrap();
        let err = f
            .service
            .update_status(item.id, ItemStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ItemError::InvalidTransition {
                from: ItemStatus::Approved,
                to: ItemStatus::Pending
            }
        ));
    }

    #[tokio::test]
    async fn test_bulk_status_skips_decided_items() {
        let f = fixture(false).await;
        let a = f.service.create(&f.alice, pen()).await.unwrap();
        let b = f.service.create(&f.alice, pen()).await.unwrap();
        f.service
            .update_status(b.id, ItemStatus::Approved)
            .await
            .unwrap();

        let updated = f
            .service
            .update_many_status(&[a.id, b.id], ItemStatus::Rejected)
            .await
            .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(
            f.service.find_by_id(a.id).await.unwrap().status,
            ItemStatus::Rejected
        );
        assert_eq!(
            f.service.find_by_id(b.id).await.unwrap().status,
            ItemStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_empty_id_lists_are_rejected() {
        let f = fixture(false).await;
        assert!(matches!(
            f.service.update_many_status(&[], ItemStatus::Approved).await,
            Err(ItemError::Validation(_))
        ));
        assert!(matches!(
            f.service.delete_many_for(&f.alice, &[]).await,
            Err(ItemError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_double_delete_reports_not_found() {
        let f = fixture(false).await;
        let item = f.service.create(&f.alice, pen()).await.unwrap();

        f.service.delete(item.id).await.unwrap();
        assert!(matches!(
            f.service.delete(item.id).await,
            Err(ItemError::NotFound(_))
        ));
        assert!(f.service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_is_owner_scoped() {
        let f = fixture(false).await;
        let mine = f.service.create(&f.alice, pen()).await.unwrap();
        let theirs = f.service.create(&f.bob, pen()).await.unwrap();

        let deleted = f
            .service
            .delete_many_for(&f.alice, &[mine.id, theirs.id])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(f.service.find_by_id(theirs.id).await.is_ok());

        let deleted = f
            .service
            .delete_many_for(&f.admin, &[theirs.id])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(f.service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counts_include_every_status() {
        let f = fixture(false).await;
        let a = f.service.create(&f.alice, pen()).await.unwrap();
        f.service.create(&f.alice, pen()).await.unwrap();
        f.service.create(&f.bob, pen()).await.unwrap();
        f.service
            .update_status(a.id, ItemStatus::Approved)
            .await
            .unwrap();

        let counts = f
            .service
            .count_by_status_for_owner(f.alice.user_id)
            .await
            .unwrap();
        assert_eq!(counts[&ItemStatus::Pending], 1);
        assert_eq!(counts[&ItemStatus::Approved], 1);
        assert_eq!(counts[&ItemStatus::Rejected], 0);
    }
}
