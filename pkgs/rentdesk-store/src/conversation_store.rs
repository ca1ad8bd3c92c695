//! Conversation store - conversation metadata, participants and unread counters

use crate::entities::{conversation_participants, conversations, unread_counters};
use crate::models::from_millis;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Conversation lifecycle state; `Archived` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Archived,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStatus {
    type Err = DbErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "archived" => Ok(ConversationStatus::Archived),
            other => Err(DbErr::Type(format!(
                "unknown conversation status: {}",
                other
            ))),
        }
    }
}

/// Conversation member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub role: String,
    pub display_name: String,
}

impl Participant {
    pub fn new(
        user_id: impl Into<String>,
        role: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            display_name: display_name.into(),
        }
    }
}

/// Conversation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub organization_id: String,
    pub participants: Vec<Participant>,
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub unit_id: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub last_message_preview: String,
    /// Sparse: a participant without an entry has nothing unread
    pub unread_counts: HashMap<String, u32>,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Unread count for a user, zero when no counter exists
    pub fn unread_for(&self, user_id: &str) -> u32 {
        self.unread_counts.get(user_id).copied().unwrap_or(0)
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}

/// Input for inserting a conversation
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub organization_id: String,
    pub participants: Vec<Participant>,
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub unit_id: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub last_message_preview: String,
}

/// Field-level update for a conversation; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ConversationPatch {
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub status: Option<ConversationStatus>,
}

/// Conversation store
#[derive(Clone)]
pub struct ConversationStore {
    pub(crate) db: DatabaseConnection,
}

impl ConversationStore {
    /// Create a conversation store with an existing database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new conversation and its participants, returning the generated id.
    ///
    /// Participants are stored in the given order; a repeated user id keeps its
    /// first entry. No unread counters are created.
    pub async fn create(&self, new: NewConversation) -> Result<String, DbErr> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        let txn = self.db.begin().await?;

        conversations::Entity::insert(conversations::ActiveModel {
            id: Set(id.clone()),
            organization_id: Set(new.organization_id.clone()),
            tenant_id: Set(new.tenant_id),
            property_id: Set(new.property_id),
            unit_id: Set(new.unit_id),
            last_message_at: Set(new.last_message_at.timestamp_millis()),
            last_message_preview: Set(new.last_message_preview),
            status: Set(ConversationStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .exec_without_returning(&txn)
        .await?;

        let mut seen = HashSet::new();
        let rows: Vec<conversation_participants::ActiveModel> = new
            .participants
            .into_iter()
            .filter(|p| seen.insert(p.user_id.clone()))
            .enumerate()
            .map(|(position, p)| conversation_participants::ActiveModel {
                conversation_id: Set(id.clone()),
                user_id: Set(p.user_id),
                role: Set(p.role),
                display_name: Set(p.display_name),
                position: Set(position as i32),
            })
            .collect();

        if !rows.is_empty() {
            conversation_participants::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(
            "Created conversation {} in organization {}",
            id, new.organization_id
        );
        Ok(id)
    }

    /// Get a single conversation by ID
    pub async fn get(&self, id: &str) -> Result<Option<Conversation>, DbErr> {
        let conv = conversations::Entity::find()
            .filter(conversations::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        match conv {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Merge the set fields of `patch` into a conversation; returns `None` when it does not exist
    pub async fn patch(
        &self,
        id: &str,
        patch: ConversationPatch,
    ) -> Result<Option<Conversation>, DbErr> {
        let conv = conversations::Entity::find()
            .filter(conversations::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        let Some(model) = conv else {
            return Ok(None);
        };

        let mut active: conversations::ActiveModel = model.into();
        if let Some(at) = patch.last_message_at {
            active.last_message_at = Set(at.timestamp_millis());
        }
        if let Some(preview) = patch.last_message_preview {
            active.last_message_preview = Set(preview);
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().timestamp_millis());
        let model = active.update(&self.db).await?;

        debug!("Patched conversation {}", id);
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    /// All conversations of an organization, in storage order
    pub async fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Conversation>, DbErr> {
        let convs = conversations::Entity::find()
            .filter(conversations::Column::OrganizationId.eq(organization_id))
            .all(&self.db)
            .await?;

        self.hydrate(convs).await
    }

    /// All conversations of an organization, most recent activity first
    pub async fn list_by_last_activity(
        &self,
        organization_id: &str,
    ) -> Result<Vec<Conversation>, DbErr> {
        let convs = conversations::Entity::find()
            .filter(conversations::Column::OrganizationId.eq(organization_id))
            .order_by_desc(conversations::Column::LastMessageAt)
            .order_by_desc(conversations::Column::CreatedAt)
            .all(&self.db)
            .await?;

        self.hydrate(convs).await
    }

    /// First active conversation linked to a tenant within an organization
    pub async fn find_active_by_tenant(
        &self,
        organization_id: &str,
        tenant_id: &str,
    ) -> Result<Option<Conversation>, DbErr> {
        let conv = conversations::Entity::find()
            .filter(conversations::Column::OrganizationId.eq(organization_id))
            .filter(conversations::Column::TenantId.eq(tenant_id))
            .filter(conversations::Column::Status.eq(ConversationStatus::Active.as_str()))
            .order_by_asc(conversations::Column::CreatedAt)
            .one(&self.db)
            .await?;

        match conv {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Participants of a conversation in list order
    pub async fn participants(&self, conversation_id: &str) -> Result<Vec<Participant>, DbErr> {
        let rows = conversation_participants::Entity::find()
            .filter(conversation_participants::Column::ConversationId.eq(conversation_id))
            .order_by_asc(conversation_participants::Column::Position)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }

    /// Unread counters that have been touched for a conversation
    pub async fn unread_counts(
        &self,
        conversation_id: &str,
    ) -> Result<HashMap<String, u32>, DbErr> {
        let rows = unread_counters::Entity::find()
            .filter(unread_counters::Column::ConversationId.eq(conversation_id))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.user_id, r.unread.max(0) as u32))
            .collect())
    }

    /// Add one unread message for every participant except `sender_id`.
    ///
    /// Each counter is bumped with a single upsert so concurrent senders never
    /// overwrite each other's increments.
    pub async fn increment_unread_except(
        &self,
        conversation_id: &str,
        sender_id: &str,
    ) -> Result<usize, DbErr> {
        let now = Utc::now().timestamp_millis();
        let rows: Vec<unread_counters::ActiveModel> = self
            .participants(conversation_id)
            .await?
            .into_iter()
            .filter(|p| p.user_id != sender_id)
            .map(|p| unread_counters::ActiveModel {
                conversation_id: Set(conversation_id.to_string()),
                user_id: Set(p.user_id),
                unread: Set(1),
                updated_at: Set(now),
            })
            .collect();

        if rows.is_empty() {
            return Ok(0);
        }
        let recipients = rows.len();

        unread_counters::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    unread_counters::Column::ConversationId,
                    unread_counters::Column::UserId,
                ])
                .value(
                    unread_counters::Column::Unread,
                    Expr::col(unread_counters::Column::Unread).add(1),
                )
                .update_column(unread_counters::Column::UpdatedAt)
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        debug!(
            "Incremented unread for {} participants of {}",
            recipients, conversation_id
        );
        Ok(recipients)
    }

    /// Set a participant's unread counter to zero.
    ///
    /// Returns `false` without writing when `user_id` is not a participant, so
    /// counter keys always stay within the participant list.
    pub async fn reset_unread(&self, conversation_id: &str, user_id: &str) -> Result<bool, DbErr> {
        let is_participant = conversation_participants::Entity::find()
            .filter(conversation_participants::Column::ConversationId.eq(conversation_id))
            .filter(conversation_participants::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .is_some();

        if !is_participant {
            return Ok(false);
        }

        unread_counters::Entity::insert(unread_counters::ActiveModel {
            conversation_id: Set(conversation_id.to_string()),
            user_id: Set(user_id.to_string()),
            unread: Set(0),
            updated_at: Set(Utc::now().timestamp_millis()),
        })
        .on_conflict(
            OnConflict::columns([
                unread_counters::Column::ConversationId,
                unread_counters::Column::UserId,
            ])
            .update_columns([
                unread_counters::Column::Unread,
                unread_counters::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;

        Ok(true)
    }

    /// Attach participants and unread counters to conversation rows
    async fn hydrate(&self, models: Vec<conversations::Model>) -> Result<Vec<Conversation>, DbErr> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

        let mut participants: HashMap<String, Vec<Participant>> = HashMap::new();
        for row in conversation_participants::Entity::find()
            .filter(conversation_participants::Column::ConversationId.is_in(ids.clone()))
            .order_by_asc(conversation_participants::Column::Position)
            .all(&self.db)
            .await?
        {
            participants
                .entry(row.conversation_id.clone())
                .or_default()
                .push(Participant::from(row));
        }

        let mut counters: HashMap<String, HashMap<String, u32>> = HashMap::new();
        for row in unread_counters::Entity::find()
            .filter(unread_counters::Column::ConversationId.is_in(ids))
            .all(&self.db)
            .await?
        {
            counters
                .entry(row.conversation_id)
                .or_default()
                .insert(row.user_id, row.unread.max(0) as u32);
        }

        models
            .into_iter()
            .map(|model| {
                let status = model.status.parse()?;
                Ok(Conversation {
                    participants: participants.remove(&model.id).unwrap_or_default(),
                    unread_counts: counters.remove(&model.id).unwrap_or_default(),
                    id: model.id,
                    organization_id: model.organization_id,
                    tenant_id: model.tenant_id,
                    property_id: model.property_id,
                    unit_id: model.unit_id,
                    last_message_at: from_millis(model.last_message_at),
                    last_message_preview: model.last_message_preview,
                    status,
                    created_at: from_millis(model.created_at),
                    updated_at: from_millis(model.updated_at),
                })
            })
            .collect()
    }
}

impl From<conversation_participants::Model> for Participant {
    fn from(model: conversation_participants::Model) -> Self {
        Self {
            user_id: model.user_id,
            role: model.role,
            display_name: model.display_name,
        }
    }
}
