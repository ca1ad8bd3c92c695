//! Conversation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub unit_id: Option<String>,
    pub last_message_at: i64,         // Millis, used for activity ordering
    pub last_message_preview: String, // Truncated content of the latest message
    pub status: String,               // "active" or "archived"
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::conversation_participants::Entity")]
    Participants,
    #[sea_orm(has_many = "super::unread_counters::Entity")]
    UnreadCounters,
}

impl Related<super::conversation_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::unread_counters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnreadCounters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
