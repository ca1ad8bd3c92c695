//! Message entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64, // Insertion order, breaks created_at ties
    #[sea_orm(unique)]
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_edited: bool,
    pub edited_at: Option<i64>,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
    pub reply_to_id: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message_attachments::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::message_reactions::Entity")]
    Reactions,
    #[sea_orm(has_many = "super::read_receipts::Entity")]
    ReadReceipts,
}

impl Related<super::message_attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::message_reactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reactions.def()
    }
}

impl Related<super::read_receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadReceipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
