//! Message report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reason stored when the reporter gave none.
pub const DEFAULT_REASON: &str = "No reason provided";

/// A user's report against a community message.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "message_report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The reported message. May already be soft-deleted.
    #[sea_orm(indexed)]
    pub message_id: i32,
    /// The user who filed the report.
    pub reporter_id: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::community_message::Entity",
        from = "Column::MessageId",
        to = "super::community_message::Column::Id"
    )]
    Message,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
}

impl Related<super::community_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
