use crate::entities::{items, prelude::*};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

const OWNER_STATUS_INDEX: &str = "idx_items_owner_status";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Items)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Per-owner listings and status counts filter on both columns.
        manager
            .create_index(
                Index::create()
                    .name(OWNER_STATUS_INDEX)
                    .table(Items)
                    .col(items::Column::OwnerId)
                    .col(items::Column::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(OWNER_STATUS_INDEX).table(Items).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Items).to_owned())
            .await
    }
}
