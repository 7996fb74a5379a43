//! Create user table migration.
//!
//! Accounts are owned elsewhere; this only guarantees the joined columns exist
//! on a fresh database. Rolling back leaves the table and its rows in place.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Name).string_len(256))
                    .col(ColumnDef::new(User::Username).string_len(128).unique_key())
                    .col(ColumnDef::new(User::AvatarChoice).string_len(64))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // The table may predate this migration, so it is never dropped here
        Ok(())
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Name,
    Username,
    AvatarChoice,
}
