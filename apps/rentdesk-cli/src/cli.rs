use clap::{Parser, Subcommand};
use rentdesk_store::{Attachment, Participant};
use std::path::PathBuf;

/// Manage Rentdesk conversations from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "RENTDESK_DB", default_value = "rentdesk.db")]
    pub db: PathBuf,

    /// Log filter, e.g. `info` or `rentdesk_messaging=debug`
    #[arg(long, env = "RENTDESK_LOG")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register an organization
    AddOrganization { id: String, name: String },

    /// Register a user
    AddUser { id: String, display_name: String },

    /// Register a tenant of an organization
    AddTenant {
        #[arg(long)]
        org: String,
        id: String,
        display_name: String,
        #[arg(long)]
        property: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },

    /// Move a tenant to another property/unit
    MoveTenant {
        id: String,
        #[arg(long)]
        property: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },

    /// Start a conversation with an initial message
    CreateConversation {
        #[arg(long)]
        org: String,
        #[arg(long)]
        sender: String,
        /// Participant as `user_id:role:display name`, repeatable
        #[arg(long = "participant", required = true, value_parser = parse_participant)]
        participants: Vec<Participant>,
        #[arg(long)]
        tenant: Option<String>,
        #[arg(long)]
        property: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        message: String,
    },

    /// Send a message to a conversation
    Send {
        conversation: String,
        #[arg(long)]
        sender: String,
        /// Attachment as JSON `{"name":..,"url":..,"storage_ref":..,"mime_type":..}`, repeatable
        #[arg(long = "attachment", value_parser = parse_attachment)]
        attachments: Vec<Attachment>,
        content: String,
    },

    /// Reply to a message
    Reply {
        conversation: String,
        #[arg(long)]
        sender: String,
        #[arg(long = "to")]
        reply_to: String,
        #[arg(long = "attachment", value_parser = parse_attachment)]
        attachments: Vec<Attachment>,
        content: String,
    },

    /// Mark every message of a conversation read for a user
    MarkRead { conversation: String, user: String },

    /// Archive a conversation
    Archive { conversation: String },

    /// Toggle, add or remove an emoji reaction
    React {
        message: String,
        user: String,
        emoji: String,
        #[arg(long, conflicts_with = "remove")]
        add: bool,
        #[arg(long)]
        remove: bool,
    },

    /// Edit a message
    Edit {
        message: String,
        user: String,
        content: String,
    },

    /// Delete a message
    Delete { message: String, user: String },

    /// Get the active conversation for a tenant, creating one if needed
    FindOrCreate {
        #[arg(long)]
        org: String,
        tenant: String,
        sender: String,
    },

    /// Show a conversation and its messages
    Show { conversation: String },

    /// List an organization's conversations, latest activity first
    List { org: String },
}

fn parse_participant(value: &str) -> Result<Participant, String> {
    let mut parts = value.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user_id), Some(role), Some(name)) if !user_id.is_empty() => {
            Ok(Participant::new(user_id, role, name))
        }
        _ => Err(format!(
            "expected `user_id:role:display name`, got `{}`",
            value
        )),
    }
}

fn parse_attachment(value: &str) -> Result<Attachment, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid attachment JSON: {}", e))
}
