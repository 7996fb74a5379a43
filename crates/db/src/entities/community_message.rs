//! Community message entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "community_message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Message text
    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(indexed)]
    pub author_id: i32,

    /// NULL = root message, Some(id) = reply to that message
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<i32>,

    /// Soft delete flag. Deleted rows stay in place for referential integrity.
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this is a root message rather than a reply.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,

    #[sea_orm(has_many = "super::message_report::Entity")]
    Reports,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::message_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
