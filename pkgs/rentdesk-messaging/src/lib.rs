//! Rentdesk Messaging - conversation and message operations
//!
//! [`MessagingService`] sits on top of the stores in `rentdesk-store` and keeps
//! the cross-record invariants that a single store write cannot:
//!
//! - unread counters rise for everyone but the sender and reset on read
//! - the sender always has a read receipt on their own message
//! - replies stay inside their conversation
//! - only the sender may edit or delete a message
//! - the conversation preview follows the latest message
//!
//! Identity and tenant lookups go through the [`TenantDirectory`] trait, which
//! `rentdesk_store::DirectoryStore` implements.

mod directory;
mod error;
mod service;

pub use directory::TenantDirectory;
pub use error::{ErrorKind, MessagingError, Result};
pub use service::{CreateConversation, MessagingService, ReactionToggle};

/// Messaging behaviour settings
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Maximum number of characters kept in a conversation preview
    pub preview_max_chars: usize,

    /// Content written over a message when it is deleted
    pub deleted_placeholder: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            preview_max_chars: 100,
            deleted_placeholder: "This message was deleted".to_string(),
        }
    }
}
