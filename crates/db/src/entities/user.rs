//! User entity.
//!
//! The `user` table belongs to the account system. This layer only maps the
//! public columns it joins against, so every author projection is limited to
//! these four fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(nullable)]
    pub username: Option<String>,

    /// Identifier of the preset avatar the user picked
    #[sea_orm(nullable)]
    pub avatar_choice: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::community_message::Entity")]
    Messages,

    #[sea_orm(has_many = "super::message_report::Entity")]
    Reports,
}

impl Related<super::community_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::message_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
