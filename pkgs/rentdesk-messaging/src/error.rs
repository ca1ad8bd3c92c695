use rentdesk_store::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Reply target not found: {0}")]
    ReplyTargetNotFound(String),

    #[error("Reply target in wrong conversation: {0}")]
    ReplyTargetWrongConversation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Coarse failure category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidReference,
    Forbidden,
    Storage,
}

impl MessagingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MessagingError::ConversationNotFound(_)
            | MessagingError::MessageNotFound(_)
            | MessagingError::OrganizationNotFound(_)
            | MessagingError::TenantNotFound(_)
            | MessagingError::UserNotFound(_) => ErrorKind::NotFound,
            MessagingError::ReplyTargetNotFound(_)
            | MessagingError::ReplyTargetWrongConversation(_) => ErrorKind::InvalidReference,
            MessagingError::Forbidden(_) => ErrorKind::Forbidden,
            MessagingError::Database(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, MessagingError>;
