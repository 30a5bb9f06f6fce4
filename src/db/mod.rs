use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{ItemId, ItemStatus, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::item::{Item, ItemPatch};
pub use repositories::user::{InsertOutcome, NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let in_memory = is_sqlite_memory(db_url);
        if db_url.starts_with("sqlite:") && !in_memory {
            prepare_sqlite_file(db_url).await?;
        }

        // Every connection to `sqlite::memory:` opens its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Recycling the only connection would drop an in-memory database.
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            backend = ?conn.get_database_backend(),
            "Database connected & migrations applied (pool: {}-{})",
            min_connections,
            max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Name of the most recently applied schema migration, if any.
    pub async fn latest_migration(&self) -> Result<Option<String>> {
        let applied = migrator::Migrator::get_applied_migrations(&self.conn)
            .await
            .context("Failed to read applied migrations")?;

        Ok(applied.last().map(|m| m.name().to_string()))
    }

    // ========== User Repository Methods ==========

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn insert_user(
        &self,
        new_user: NewUser,
        config: &SecurityConfig,
    ) -> Result<InsertOutcome> {
        self.user_repo().insert(new_user, config).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_credentials(username, password)
            .await
    }

    // ========== Item Repository Methods ==========

    fn item_repo(&self) -> repositories::item::ItemRepository {
        repositories::item::ItemRepository::new(self.conn.clone())
    }

    pub async fn add_item(
        &self,
        owner: UserId,
        title: &str,
        amount: f64,
        quantity: i32,
    ) -> Result<Item> {
        self.item_repo().insert(owner, title, amount, quantity).await
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.item_repo().list_all().await
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.item_repo().get(id).await
    }

    pub async fn update_item_fields(&self, id: ItemId, patch: ItemPatch) -> Result<Option<Item>> {
        self.item_repo().update_fields(id, patch).await
    }

    pub async fn update_item_status(
        &self,
        id: ItemId,
        status: ItemStatus,
    ) -> Result<Option<Item>> {
        self.item_repo().update_status(id, status).await
    }

    pub async fn update_pending_items_status(
        &self,
        ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64> {
        self.item_repo().update_pending_status(ids, status).await
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<bool> {
        self.item_repo().delete(id).await
    }

    pub async fn delete_items(&self, ids: &[ItemId]) -> Result<u64> {
        self.item_repo().delete_many(ids).await
    }

    pub async fn delete_owned_items(&self, ids: &[ItemId], owner: UserId) -> Result<u64> {
        self.item_repo().delete_many_owned(ids, owner).await
    }

    pub async fn count_items_by_status(&self, owner: UserId) -> Result<Vec<(ItemStatus, i64)>> {
        self.item_repo().count_by_status(owner).await
    }
}

fn is_sqlite_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Creates the database file (and its directory) for a `sqlite:` URL.
async fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    let path_str = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path_str = path_str.split('?').next().unwrap_or(path_str);
    let path = Path::new(path_str);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    if !path.exists() {
        tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create database file: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_url_detection() {
        assert!(is_sqlite_memory("sqlite::memory:"));
        assert!(is_sqlite_memory("sqlite:file:test?mode=memory&cache=shared"));
        assert!(!is_sqlite_memory("sqlite:data/workflow.db"));
        assert!(!is_sqlite_memory("postgres://app@localhost/workflow"));
    }

    #[tokio::test]
    async fn test_migrations_are_recorded() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();

        let latest = store.latest_migration().await.unwrap();
        assert_eq!(latest.as_deref(), Some("m20241014_000002_create_items"));
    }
}
