use anyhow::{Context, Result};
use rentdesk_messaging::{CreateConversation, MessagingService};
use rentdesk_store::{DirectoryStore, TenantInfo};
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::Command;

/// Run one command and return its JSON result
pub async fn run(
    command: Command,
    service: &MessagingService,
    directory: &DirectoryStore,
) -> Result<Value> {
    let output = match command {
        Command::AddOrganization { id, name } => {
            directory.add_organization(&id, &name).await?;
            json!({ "organization_id": id })
        }
        Command::AddUser { id, display_name } => {
            directory.add_user(&id, &display_name).await?;
            json!({ "user_id": id })
        }
        Command::AddTenant {
            org,
            id,
            display_name,
            property,
            unit,
        } => {
            directory
                .add_tenant(TenantInfo {
                    id: id.clone(),
                    organization_id: org,
                    display_name,
                    property_id: property,
                    unit_id: unit,
                })
                .await?;
            json!({ "tenant_id": id })
        }
        Command::MoveTenant { id, property, unit } => {
            let moved = directory
                .move_tenant(&id, property.as_deref(), unit.as_deref())
                .await?;
            if !moved {
                anyhow::bail!("Tenant not found: {}", id);
            }
            json!({ "tenant_id": id })
        }
        Command::CreateConversation {
            org,
            sender,
            participants,
            tenant,
            property,
            unit,
            message,
        } => {
            let id = service
                .create_conversation(CreateConversation {
                    organization_id: org,
                    participants,
                    initial_message: message,
                    sender_id: sender,
                    tenant_id: tenant,
                    property_id: property,
                    unit_id: unit,
                })
                .await?;
            json!({ "conversation_id": id })
        }
        Command::Send {
            conversation,
            sender,
            attachments,
            content,
        } => {
            let id = service
                .send_message(&conversation, &sender, &content, attachments)
                .await?;
            json!({ "message_id": id })
        }
        Command::Reply {
            conversation,
            sender,
            reply_to,
            attachments,
            content,
        } => {
            let id = service
                .reply_to_message(&conversation, &sender, &content, &reply_to, attachments)
                .await?;
            json!({ "message_id": id })
        }
        Command::MarkRead { conversation, user } => {
            service.mark_as_read(&conversation, &user).await?;
            to_json(&service.conversation(&conversation).await?)?
        }
        Command::Archive { conversation } => {
            to_json(&service.archive_conversation(&conversation).await?)?
        }
        Command::React {
            message,
            user,
            emoji,
            add,
            remove,
        } => {
            if add {
                let added = service.add_reaction(&message, &user, &emoji).await?;
                json!({ "added": added })
            } else if remove {
                service.remove_reaction(&message, &user, &emoji).await?;
                json!({ "removed": true })
            } else {
                to_json(&service.toggle_reaction(&message, &user, &emoji).await?)?
            }
        }
        Command::Edit {
            message,
            user,
            content,
        } => to_json(&service.edit_message(&message, &user, &content).await?)?,
        Command::Delete { message, user } => {
            to_json(&service.delete_message(&message, &user).await?)?
        }
        Command::FindOrCreate {
            org,
            tenant,
            sender,
        } => {
            let id = service
                .find_or_create_conversation(&org, &tenant, &sender)
                .await?;
            json!({ "conversation_id": id })
        }
        Command::Show { conversation } => {
            let summary = service.conversation(&conversation).await?;
            let messages = service.messages(&conversation).await?;
            json!({ "conversation": summary, "messages": messages })
        }
        Command::List { org } => to_json(&service.conversations(&org).await?)?,
    };

    Ok(output)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentdesk_messaging::MessagingConfig;
    use rentdesk_store::{connect, PersistenceConfig};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    async fn setup(path: &NamedTempFile) -> (MessagingService, DirectoryStore) {
        let db = connect(&PersistenceConfig {
            db_path: path.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();
        let directory = DirectoryStore::new(db.clone());
        let service = MessagingService::new(
            db,
            Arc::new(directory.clone()),
            MessagingConfig::default(),
        );
        (service, directory)
    }

    #[tokio::test]
    async fn test_find_or_create_then_show() {
        let temp_file = NamedTempFile::new().unwrap();
        let (service, directory) = setup(&temp_file).await;

        run(
            Command::AddOrganization {
                id: "org-1".to_string(),
                name: "Maple Lettings".to_string(),
            },
            &service,
            &directory,
        )
        .await
        .unwrap();
        run(
            Command::AddUser {
                id: "owner-a".to_string(),
                display_name: "Ana".to_string(),
            },
            &service,
            &directory,
        )
        .await
        .unwrap();
        run(
            Command::AddTenant {
                org: "org-1".to_string(),
                id: "tenant-x".to_string(),
                display_name: "Xavier".to_string(),
                property: Some("prop-1".to_string()),
                unit: None,
            },
            &service,
            &directory,
        )
        .await
        .unwrap();

        let created = run(
            Command::FindOrCreate {
                org: "org-1".to_string(),
                tenant: "tenant-x".to_string(),
                sender: "owner-a".to_string(),
            },
            &service,
            &directory,
        )
        .await
        .unwrap();
        let conversation_id = created["conversation_id"].as_str().unwrap().to_string();

        let shown = run(
            Command::Show {
                conversation: conversation_id.clone(),
            },
            &service,
            &directory,
        )
        .await
        .unwrap();
        assert_eq!(shown["conversation"]["id"], conversation_id.as_str());
        assert_eq!(shown["conversation"]["property_id"], "prop-1");
        assert_eq!(shown["conversation"]["status"], "active");
        assert_eq!(shown["messages"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_move_unknown_tenant_fails() {
        let temp_file = NamedTempFile::new().unwrap();
        let (service, directory) = setup(&temp_file).await;

        let result = run(
            Command::MoveTenant {
                id: "nobody".to_string(),
                property: None,
                unit: None,
            },
            &service,
            &directory,
        )
        .await;
        assert!(result.is_err());
    }
}
