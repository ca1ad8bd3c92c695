use std::sync::Arc;

use chrono::Utc;
use rentdesk_store::{
    connect, Attachment, Conversation, ConversationPatch, ConversationStatus, ConversationStore,
    DatabaseConnection, DirectoryStore, Message, MessagePatch, MessageStore, NewConversation,
    NewMessage, Participant, PersistenceConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::directory::TenantDirectory;
use crate::error::{MessagingError, Result};
use crate::MessagingConfig;

/// Input for [`MessagingService::create_conversation`]
#[derive(Debug, Clone)]
pub struct CreateConversation {
    pub organization_id: String,
    /// Expected to include the sender
    pub participants: Vec<Participant>,
    pub initial_message: String,
    pub sender_id: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub unit_id: Option<String>,
}

/// Outcome of [`MessagingService::toggle_reaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionToggle {
    pub added: bool,
}

/// Conversation and message operations
#[derive(Clone)]
pub struct MessagingService {
    conversations: ConversationStore,
    messages: MessageStore,
    directory: Arc<dyn TenantDirectory>,
    config: MessagingConfig,
}

impl MessagingService {
    pub fn new(
        db: DatabaseConnection,
        directory: Arc<dyn TenantDirectory>,
        config: MessagingConfig,
    ) -> Self {
        Self {
            conversations: ConversationStore::new(db.clone()),
            messages: MessageStore::new(db),
            directory,
            config,
        }
    }

    /// Open the database and use its directory tables for lookups
    pub async fn open(
        persistence: &PersistenceConfig,
        config: MessagingConfig,
    ) -> anyhow::Result<Self> {
        let db = connect(persistence).await?;
        let directory = Arc::new(DirectoryStore::new(db.clone()));
        Ok(Self::new(db, directory, config))
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    /// Start a conversation with an initial message from `sender_id`.
    ///
    /// Nobody is marked unread for the initial message.
    pub async fn create_conversation(&self, request: CreateConversation) -> Result<String> {
        if !self
            .directory
            .organization_exists(&request.organization_id)
            .await?
        {
            return Err(MessagingError::OrganizationNotFound(request.organization_id));
        }

        let conversation_id = self
            .conversations
            .create(NewConversation {
                organization_id: request.organization_id,
                participants: request.participants,
                tenant_id: request.tenant_id,
                property_id: request.property_id,
                unit_id: request.unit_id,
                last_message_at: Utc::now(),
                last_message_preview: self.preview(&request.initial_message),
            })
            .await?;

        self.messages
            .create(NewMessage {
                conversation_id: conversation_id.clone(),
                sender_id: request.sender_id,
                content: request.initial_message,
                attachments: vec![],
                reply_to_id: None,
            })
            .await?;

        Ok(conversation_id)
    }

    /// Post a message and bump the unread counter of every other participant
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<String> {
        self.require_conversation(conversation_id).await?;
        self.post(NewMessage {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            attachments,
            reply_to_id: None,
        })
        .await
    }

    /// Post a message that replies to another message of the same conversation
    pub async fn reply_to_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        reply_to_id: &str,
        attachments: Vec<Attachment>,
    ) -> Result<String> {
        self.require_conversation(conversation_id).await?;

        let target = self
            .messages
            .get(reply_to_id)
            .await?
            .ok_or_else(|| MessagingError::ReplyTargetNotFound(reply_to_id.to_string()))?;
        if target.conversation_id != conversation_id {
            warn!(
                "Rejected reply from {} to {} outside conversation {}",
                sender_id, reply_to_id, conversation_id
            );
            return Err(MessagingError::ReplyTargetWrongConversation(
                reply_to_id.to_string(),
            ));
        }

        self.post(NewMessage {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            attachments,
            reply_to_id: Some(reply_to_id.to_string()),
        })
        .await
    }

    /// Clear a user's unread counter and give them a receipt on every message.
    ///
    /// Repeating the call changes nothing; existing receipts keep their time.
    pub async fn mark_as_read(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.require_conversation(conversation_id).await?;

        if !self
            .conversations
            .reset_unread(conversation_id, user_id)
            .await?
        {
            debug!(
                "{} is not a participant of {}, no counter written",
                user_id, conversation_id
            );
        }
        let appended = self
            .messages
            .add_read_receipts(conversation_id, user_id, Utc::now())
            .await?;

        debug!(
            "Marked {} read for {} ({} new receipts)",
            conversation_id, user_id, appended
        );
        Ok(())
    }

    /// Mark a conversation archived; message operations keep working afterwards
    pub async fn archive_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        let conversation = self
            .conversations
            .patch(
                conversation_id,
                ConversationPatch {
                    status: Some(ConversationStatus::Archived),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| MessagingError::ConversationNotFound(conversation_id.to_string()))?;

        info!("Archived conversation {}", conversation_id);
        Ok(conversation)
    }

    /// Remove the user's reaction if present, otherwise add it
    pub async fn toggle_reaction(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<ReactionToggle> {
        self.require_message(message_id).await?;
        let added = self
            .messages
            .toggle_reaction(message_id, user_id, emoji)
            .await?;

        debug!(
            "Reaction {} by {} on {}: added={}",
            emoji, user_id, message_id, added
        );
        Ok(ReactionToggle { added })
    }

    /// Add a reaction; `Ok(false)` means it already existed and nothing changed
    pub async fn add_reaction(&self, message_id: &str, user_id: &str, emoji: &str) -> Result<bool> {
        self.require_message(message_id).await?;
        let added = self.messages.add_reaction(message_id, user_id, emoji).await?;
        if !added {
            debug!("Reaction {} by {} already on {}", emoji, user_id, message_id);
        }
        Ok(added)
    }

    /// Remove a reaction if present
    pub async fn remove_reaction(&self, message_id: &str, user_id: &str, emoji: &str) -> Result<()> {
        self.require_message(message_id).await?;
        self.messages
            .remove_reaction(message_id, user_id, emoji)
            .await?;
        Ok(())
    }

    /// Replace the content of a message.
    ///
    /// Only the sender may edit, and deleted messages stay deleted. The
    /// conversation preview follows the edit when the message is the latest one.
    pub async fn edit_message(
        &self,
        message_id: &str,
        user_id: &str,
        new_content: &str,
    ) -> Result<Message> {
        let message = self.require_message(message_id).await?;
        if message.sender_id != user_id {
            warn!("User {} tried to edit message {}", user_id, message_id);
            return Err(MessagingError::Forbidden(format!(
                "only the sender can edit message {}",
                message_id
            )));
        }
        if message.is_deleted {
            warn!("Rejected edit of deleted message {}", message_id);
            return Err(MessagingError::Forbidden(format!(
                "message {} has been deleted",
                message_id
            )));
        }

        let edited = self
            .messages
            .patch(
                message_id,
                MessagePatch {
                    content: Some(new_content.to_string()),
                    edited_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| MessagingError::MessageNotFound(message_id.to_string()))?;

        let latest = self
            .messages
            .latest_by_conversation(&edited.conversation_id)
            .await?;
        if latest.is_some_and(|m| m.id == edited.id) {
            self.conversations
                .patch(
                    &edited.conversation_id,
                    ConversationPatch {
                        last_message_preview: Some(self.preview(new_content)),
                        ..Default::default()
                    },
                )
                .await?;
        }

        debug!("Edited message {}", message_id);
        Ok(edited)
    }

    /// Soft-delete a message, overwriting its content with the placeholder.
    ///
    /// The conversation preview is left as it was.
    pub async fn delete_message(&self, message_id: &str, user_id: &str) -> Result<Message> {
        let message = self.require_message(message_id).await?;
        if message.sender_id != user_id {
            warn!("User {} tried to delete message {}", user_id, message_id);
            return Err(MessagingError::Forbidden(format!(
                "only the sender can delete message {}",
                message_id
            )));
        }
        if message.is_deleted {
            return Ok(message);
        }

        let deleted = self
            .messages
            .patch(
                message_id,
                MessagePatch {
                    content: Some(self.config.deleted_placeholder.clone()),
                    deleted_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| MessagingError::MessageNotFound(message_id.to_string()))?;

        info!("Deleted message {}", message_id);
        Ok(deleted)
    }

    /// Return the tenant's active conversation, creating an empty one if there is none.
    ///
    /// A new conversation has the sender as its only participant and copies the
    /// tenant's current property and unit.
    pub async fn find_or_create_conversation(
        &self,
        organization_id: &str,
        tenant_id: &str,
        sender_id: &str,
    ) -> Result<String> {
        if let Some(existing) = self
            .conversations
            .find_active_by_tenant(organization_id, tenant_id)
            .await?
        {
            debug!("Found conversation {} for tenant {}", existing.id, tenant_id);
            return Ok(existing.id);
        }

        let tenant = self
            .directory
            .tenant(organization_id, tenant_id)
            .await?
            .ok_or_else(|| MessagingError::TenantNotFound(tenant_id.to_string()))?;
        let sender = self
            .directory
            .user(sender_id)
            .await?
            .ok_or_else(|| MessagingError::UserNotFound(sender_id.to_string()))?;

        let conversation_id = self
            .conversations
            .create(NewConversation {
                organization_id: organization_id.to_string(),
                participants: vec![Participant::new(sender.id, "owner", sender.display_name)],
                tenant_id: Some(tenant.id),
                property_id: tenant.property_id,
                unit_id: tenant.unit_id,
                last_message_at: Utc::now(),
                last_message_preview: String::new(),
            })
            .await?;

        Ok(conversation_id)
    }

    pub async fn conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.require_conversation(conversation_id).await
    }

    /// Messages of a conversation, oldest first
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.require_conversation(conversation_id).await?;
        Ok(self.messages.list_by_conversation(conversation_id).await?)
    }

    /// Conversations of an organization, most recent activity first
    pub async fn conversations(&self, organization_id: &str) -> Result<Vec<Conversation>> {
        Ok(self
            .conversations
            .list_by_last_activity(organization_id)
            .await?)
    }

    /// Store a message, then refresh the conversation summary.
    ///
    /// A failure after the insert leaves the message in place with a stale summary.
    async fn post(&self, new: NewMessage) -> Result<String> {
        let conversation_id = new.conversation_id.clone();
        let sender_id = new.sender_id.clone();
        let preview = self.preview(&new.content);

        let message = self.messages.create(new).await?;

        self.conversations
            .increment_unread_except(&conversation_id, &sender_id)
            .await?;
        self.conversations
            .patch(
                &conversation_id,
                ConversationPatch {
                    last_message_at: Some(message.created_at),
                    last_message_preview: Some(preview),
                    ..Default::default()
                },
            )
            .await?;

        Ok(message.id)
    }

    async fn require_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| MessagingError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn require_message(&self, message_id: &str) -> Result<Message> {
        self.messages
            .get(message_id)
            .await?
            .ok_or_else(|| MessagingError::MessageNotFound(message_id.to_string()))
    }

    fn preview(&self, content: &str) -> String {
        truncate_chars(content, self.config.preview_max_chars)
    }
}

/// First `max` characters of `content`
fn truncate_chars(content: &str, max: usize) -> String {
    content.chars().take(max).collect()
}
