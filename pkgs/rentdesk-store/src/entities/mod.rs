//! Sea-ORM entities for rentdesk-store

pub mod conversation_participants;
pub mod conversations;
pub mod message_attachments;
pub mod message_reactions;
pub mod messages;
pub mod organizations;
pub mod read_receipts;
pub mod tenants;
pub mod unread_counters;
pub mod users;

pub use conversation_participants::Entity as ConversationParticipant;
pub use conversations::Entity as Conversation;
pub use message_attachments::Entity as MessageAttachment;
pub use message_reactions::Entity as MessageReaction;
pub use messages::Entity as Message;
pub use organizations::Entity as Organization;
pub use read_receipts::Entity as ReadReceipt;
pub use tenants::Entity as Tenant;
pub use unread_counters::Entity as UnreadCounter;
pub use users::Entity as User;
