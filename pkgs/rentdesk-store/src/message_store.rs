//! Message store - messages with attachments, reactions and read receipts

use crate::entities::{message_attachments, message_reactions, messages, read_receipts};
use crate::models::{
    from_millis, Attachment, Message, MessagePatch, NewMessage, Reaction, ReadReceipt,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Message store - manages persistent message storage
#[derive(Clone)]
pub struct MessageStore {
    pub(crate) db: DatabaseConnection,
}

impl MessageStore {
    /// Create a message store with an existing database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a new message.
    ///
    /// The sender is recorded as having read the message at creation time.
    pub async fn create(&self, new: NewMessage) -> Result<Message, DbErr> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        let txn = self.db.begin().await?;

        messages::Entity::insert(messages::ActiveModel {
            id: Set(id.clone()),
            conversation_id: Set(new.conversation_id.clone()),
            sender_id: Set(new.sender_id.clone()),
            content: Set(new.content),
            is_edited: Set(false),
            edited_at: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            reply_to_id: Set(new.reply_to_id),
            created_at: Set(now),
            ..Default::default()
        })
        .exec_without_returning(&txn)
        .await?;

        if !new.attachments.is_empty() {
            let rows = new
                .attachments
                .into_iter()
                .enumerate()
                .map(|(position, a)| message_attachments::ActiveModel {
                    message_id: Set(id.clone()),
                    position: Set(position as i32),
                    name: Set(a.name),
                    url: Set(a.url),
                    storage_ref: Set(a.storage_ref),
                    mime_type: Set(a.mime_type),
                    ..Default::default()
                });
            message_attachments::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        read_receipts::Entity::insert(read_receipts::ActiveModel {
            message_id: Set(id.clone()),
            user_id: Set(new.sender_id.clone()),
            read_at: Set(now),
            ..Default::default()
        })
        .exec_without_returning(&txn)
        .await?;

        txn.commit().await?;

        debug!(
            "Stored message {} from {} in {}",
            id, new.sender_id, new.conversation_id
        );

        self.get(&id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("message {}", id)))
    }

    /// Get message by ID
    pub async fn get(&self, id: &str) -> Result<Option<Message>, DbErr> {
        let msg = messages::Entity::find()
            .filter(messages::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        match msg {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Merge the set fields of `patch` into a message; returns `None` when it does not exist
    pub async fn patch(&self, id: &str, patch: MessagePatch) -> Result<Option<Message>, DbErr> {
        let msg = messages::Entity::find()
            .filter(messages::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        let Some(model) = msg else {
            return Ok(None);
        };

        let mut active: messages::ActiveModel = model.into();
        if let Some(content) = patch.content {
            active.content = Set(content);
        }
        if let Some(at) = patch.edited_at {
            active.is_edited = Set(true);
            active.edited_at = Set(Some(at.timestamp_millis()));
        }
        if let Some(at) = patch.deleted_at {
            active.is_deleted = Set(true);
            active.deleted_at = Set(Some(at.timestamp_millis()));
        }
        let model = active.update(&self.db).await?;

        debug!("Patched message {}", id);
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    /// All messages of a conversation, oldest first
    pub async fn list_by_conversation(&self, conversation_id: &str) -> Result<Vec<Message>, DbErr> {
        let msgs = messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Seq)
            .all(&self.db)
            .await?;

        debug!(
            "Retrieved {} messages from conversation {}",
            msgs.len(),
            conversation_id
        );
        self.hydrate(msgs).await
    }

    /// The message with the greatest `created_at` in a conversation
    pub async fn latest_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Message>, DbErr> {
        let msg = messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id))
            .order_by_desc(messages::Column::CreatedAt)
            .order_by_desc(messages::Column::Seq)
            .one(&self.db)
            .await?;

        match msg {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Add a reaction; returns `false` without writing if the same user already used this emoji
    pub async fn add_reaction(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<bool, DbErr> {
        let inserted = message_reactions::Entity::insert(message_reactions::ActiveModel {
            message_id: Set(message_id.to_string()),
            user_id: Set(user_id.to_string()),
            emoji: Set(emoji.to_string()),
            created_at: Set(Utc::now().timestamp_millis()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                message_reactions::Column::MessageId,
                message_reactions::Column::UserId,
                message_reactions::Column::Emoji,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;

        Ok(inserted > 0)
    }

    /// Remove a reaction; returns whether one was present
    pub async fn remove_reaction(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<bool, DbErr> {
        let result = message_reactions::Entity::delete_many()
            .filter(message_reactions::Column::MessageId.eq(message_id))
            .filter(message_reactions::Column::UserId.eq(user_id))
            .filter(message_reactions::Column::Emoji.eq(emoji))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Remove the reaction if present, otherwise add it; returns `true` when added
    pub async fn toggle_reaction(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<bool, DbErr> {
        if self.remove_reaction(message_id, user_id, emoji).await? {
            return Ok(false);
        }
        // A concurrent toggle may have inserted first; the reaction exists either way.
        self.add_reaction(message_id, user_id, emoji).await?;
        Ok(true)
    }

    /// Give `user_id` a read receipt on every message of the conversation that lacks one.
    ///
    /// Existing receipts keep their original timestamp. Returns the number appended.
    pub async fn add_read_receipts(
        &self,
        conversation_id: &str,
        user_id: &str,
        read_at: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let message_ids: Vec<String> = messages::Entity::find()
            .select_only()
            .column(messages::Column::Id)
            .filter(messages::Column::ConversationId.eq(conversation_id))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Seq)
            .into_tuple()
            .all(&self.db)
            .await?;

        if message_ids.is_empty() {
            return Ok(0);
        }

        let already_read: HashSet<String> = read_receipts::Entity::find()
            .filter(read_receipts::Column::UserId.eq(user_id))
            .filter(read_receipts::Column::MessageId.is_in(message_ids.clone()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.message_id)
            .collect();

        let at = read_at.timestamp_millis();
        let rows: Vec<read_receipts::ActiveModel> = message_ids
            .into_iter()
            .filter(|id| !already_read.contains(id))
            .map(|id| read_receipts::ActiveModel {
                message_id: Set(id),
                user_id: Set(user_id.to_string()),
                read_at: Set(at),
                ..Default::default()
            })
            .collect();

        if rows.is_empty() {
            return Ok(0);
        }

        let appended = read_receipts::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    read_receipts::Column::MessageId,
                    read_receipts::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        debug!(
            "Appended {} read receipts for {} in {}",
            appended, user_id, conversation_id
        );
        Ok(appended)
    }

    /// Attach attachments, reactions and read receipts to message rows
    async fn hydrate(&self, models: Vec<messages::Model>) -> Result<Vec<Message>, DbErr> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

        let mut attachments: HashMap<String, Vec<Attachment>> = HashMap::new();
        for row in message_attachments::Entity::find()
            .filter(message_attachments::Column::MessageId.is_in(ids.clone()))
            .order_by_asc(message_attachments::Column::Position)
            .all(&self.db)
            .await?
        {
            attachments
                .entry(row.message_id)
                .or_default()
                .push(Attachment {
                    name: row.name,
                    url: row.url,
                    storage_ref: row.storage_ref,
                    mime_type: row.mime_type,
                });
        }

        let mut reactions: HashMap<String, Vec<Reaction>> = HashMap::new();
        for row in message_reactions::Entity::find()
            .filter(message_reactions::Column::MessageId.is_in(ids.clone()))
            .order_by_asc(message_reactions::Column::Id)
            .all(&self.db)
            .await?
        {
            reactions.entry(row.message_id).or_default().push(Reaction {
                emoji: row.emoji,
                user_id: row.user_id,
                created_at: from_millis(row.created_at),
            });
        }

        let mut receipts: HashMap<String, Vec<ReadReceipt>> = HashMap::new();
        for row in read_receipts::Entity::find()
            .filter(read_receipts::Column::MessageId.is_in(ids))
            .order_by_asc(read_receipts::Column::Id)
            .all(&self.db)
            .await?
        {
            receipts.entry(row.message_id).or_default().push(ReadReceipt {
                user_id: row.user_id,
                read_at: from_millis(row.read_at),
            });
        }

        Ok(models
            .into_iter()
            .map(|model| Message {
                attachments: attachments.remove(&model.id).unwrap_or_default(),
                reactions: reactions.remove(&model.id).unwrap_or_default(),
                read_by: receipts.remove(&model.id).unwrap_or_default(),
                id: model.id,
                conversation_id: model.conversation_id,
                sender_id: model.sender_id,
                content: model.content,
                is_edited: model.is_edited,
                edited_at: model.edited_at.map(from_millis),
                is_deleted: model.is_deleted,
                deleted_at: model.deleted_at.map(from_millis),
                reply_to_id: model.reply_to_id,
                created_at: from_millis(model.created_at),
            })
            .collect())
    }
}
