//! Rentdesk Store - persistent storage for conversations and messages
//!
//! This crate provides SQLite-based storage using Sea-ORM for the messaging
//! side of the property-management dashboard.
//!
//! # Architecture
//!
//! - **ConversationStore**: conversation records, participant lists and
//!   per-participant unread counters
//! - **MessageStore**: messages with attachments, reactions, read receipts,
//!   reply links and edit/delete state
//! - **DirectoryStore**: organizations, users and tenants that conversations
//!   reference
//!
//! # Database Schema
//!
//! - `conversations`: owning organization, tenant/property/unit linkage,
//!   last message preview, status
//! - `conversation_participants`: ordered participant list
//! - `unread_counters`: one row per (conversation, user), incremented in place
//! - `messages`: content, sender, reply link, edit/delete state
//! - `message_attachments`, `message_reactions`, `read_receipts`: per-message
//!   side tables keyed by user where uniqueness matters
//! - `organizations`, `users`, `tenants`: directory data
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use rentdesk_store::{
//!     connect, ConversationStore, MessageStore, NewConversation, NewMessage, Participant,
//!     PersistenceConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = connect(&PersistenceConfig::default()).await?;
//! let conversations = ConversationStore::new(db.clone());
//! let messages = MessageStore::new(db);
//!
//! let id = conversations
//!     .create(NewConversation {
//!         organization_id: "org-1".to_string(),
//!         participants: vec![Participant::new("owner-a", "owner", "Ana")],
//!         tenant_id: None,
//!         property_id: None,
//!         unit_id: None,
//!         last_message_at: chrono::Utc::now(),
//!         last_message_preview: String::new(),
//!     })
//!     .await?;
//!
//! messages
//!     .create(NewMessage {
//!         conversation_id: id,
//!         sender_id: "owner-a".to_string(),
//!         content: "Hello!".to_string(),
//!         attachments: vec![],
//!         reply_to_id: None,
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod conversation_store;
pub mod directory_store;
pub mod entities;
pub mod message_store;
pub mod migration;
pub mod models;

pub use conversation_store::{
    Conversation, ConversationPatch, ConversationStatus, ConversationStore, NewConversation,
    Participant,
};
pub use directory_store::{DirectoryStore, OrganizationInfo, TenantInfo, UserInfo};
pub use message_store::MessageStore;
pub use models::{Attachment, Message, MessagePatch, NewMessage, Reaction, ReadReceipt};
pub use sea_orm::{DatabaseConnection, DbErr};

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Configuration for persistence layer
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Path to the SQLite database file
    pub db_path: std::path::PathBuf,

    /// Pool size (default: 1, SQLite serializes writers anyway)
    pub max_connections: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_path: std::path::PathBuf::from("rentdesk.db"),
            max_connections: 1,
        }
    }
}

/// Open the database described by `config` and bring its schema up to date
pub async fn connect(config: &PersistenceConfig) -> Result<DatabaseConnection> {
    let db_path_str = config
        .db_path
        .to_str()
        .context("Invalid database path")?
        .replace("\\", "/");

    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", db_path_str));
    options
        .max_connections(config.max_connections.max(1))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("Failed to connect to database")?;

    migration::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    info!("Rentdesk store initialized at {}", config.db_path.display());
    Ok(db)
}
