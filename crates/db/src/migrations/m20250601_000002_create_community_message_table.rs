//! Create `community_message` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommunityMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityMessage::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommunityMessage::Content).text().not_null())
                    .col(ColumnDef::new(CommunityMessage::AuthorId).integer().not_null())
                    .col(ColumnDef::new(CommunityMessage::ParentId).integer())
                    .col(
                        ColumnDef::new(CommunityMessage::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CommunityMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CommunityMessage::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_message_author")
                            .from(CommunityMessage::Table, CommunityMessage::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Replies must never outlive their parent row
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_message_parent")
                            .from(CommunityMessage::Table, CommunityMessage::ParentId)
                            .to(CommunityMessage::Table, CommunityMessage::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for paginated thread listing
        manager
            .create_index(
                Index::create()
                    .name("idx_community_message_thread")
                    .table(CommunityMessage::Table)
                    .col(CommunityMessage::ParentId)
                    .col(CommunityMessage::IsDeleted)
                    .col(CommunityMessage::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: author_id
        manager
            .create_index(
                Index::create()
                    .name("idx_community_message_author_id")
                    .table(CommunityMessage::Table)
                    .col(CommunityMessage::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityMessage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommunityMessage {
    Table,
    Id,
    Content,
    AuthorId,
    ParentId,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
