//! Create `message_report` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MessageReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageReport::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MessageReport::MessageId).integer().not_null())
                    .col(ColumnDef::new(MessageReport::ReporterId).integer().not_null())
                    .col(
                        ColumnDef::new(MessageReport::Reason)
                            .text()
                            .not_null()
                            .default("No reason provided"),
                    )
                    .col(
                        ColumnDef::new(MessageReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_report_message")
                            .from(MessageReport::Table, MessageReport::MessageId)
                            .to(CommunityMessage::Table, CommunityMessage::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_report_reporter")
                            .from(MessageReport::Table, MessageReport::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: message_id for per-message report lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_message_report_message_id")
                    .table(MessageReport::Table)
                    .col(MessageReport::MessageId)
                    .col(MessageReport::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MessageReport {
    Table,
    Id,
    MessageId,
    ReporterId,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum CommunityMessage {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
