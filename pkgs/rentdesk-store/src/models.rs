//! Message record types returned by the message store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a file kept in external attachment storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub storage_ref: String,
    pub mime_type: String,
}

/// Emoji annotation left by a user on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Record that a user has seen a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user_id: String,
    pub read_at: DateTime<Utc>,
}

/// Stored message with its attachments, reactions and read receipts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub reactions: Vec<Reaction>,
    pub read_by: Vec<ReadReceipt>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub reply_to_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user_id` has a read receipt on this message
    pub fn is_read_by(&self, user_id: &str) -> bool {
        self.read_by.iter().any(|r| r.user_id == user_id)
    }

    /// Whether `user_id` reacted to this message with `emoji`
    pub fn has_reaction(&self, user_id: &str, emoji: &str) -> bool {
        self.reactions
            .iter()
            .any(|r| r.user_id == user_id && r.emoji == emoji)
    }
}

/// Input for inserting a message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub reply_to_id: Option<String>,
}

/// Field-level update for a message; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    /// Marks the message edited at this instant
    pub edited_at: Option<DateTime<Utc>>,
    /// Marks the message deleted at this instant
    pub deleted_at: Option<DateTime<Utc>>,
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
