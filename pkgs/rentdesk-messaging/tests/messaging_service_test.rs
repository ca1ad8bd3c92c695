// Copyright 2026 Rentdesk Team.
//
// Tests for MessagingService

use std::sync::Arc;

use futures::future::join_all;
use rentdesk_messaging::{
    CreateConversation, ErrorKind, MessagingConfig, MessagingError, MessagingService,
};
use rentdesk_store::{
    connect, Attachment, ConversationStatus, DirectoryStore, Participant, PersistenceConfig,
    TenantInfo,
};
use tempfile::NamedTempFile;

const ORG: &str = "org-1";
const OWNER: &str = "owner-a";
const TENANT: &str = "tenant-b";

async fn create_test_service(path: &NamedTempFile) -> (MessagingService, DirectoryStore) {
    let db = connect(&PersistenceConfig {
        db_path: path.path().to_path_buf(),
        ..Default::default()
    })
    .await
    .expect("Failed to open database");

    let directory = DirectoryStore::new(db.clone());
    directory.add_organization(ORG, "Maple Lettings").await.unwrap();
    directory.add_user(OWNER, "Ana Owner").await.unwrap();
    directory.add_user(TENANT, "Bea Tenant").await.unwrap();
    directory
        .add_tenant(TenantInfo {
            id: "tenant-x".to_string(),
            organization_id: ORG.to_string(),
            display_name: "Xavier".to_string(),
            property_id: Some("prop-1".to_string()),
            unit_id: Some("unit-4".to_string()),
        })
        .await
        .unwrap();

    let service = MessagingService::new(
        db,
        Arc::new(directory.clone()),
        MessagingConfig::default(),
    );
    (service, directory)
}

fn owner_and_tenant(initial_message: &str) -> CreateConversation {
    CreateConversation {
        organization_id: ORG.to_string(),
        participants: vec![
            Participant::new(OWNER, "owner", "Ana Owner"),
            Participant::new(TENANT, "tenant", "Bea Tenant"),
        ],
        initial_message: initial_message.to_string(),
        sender_id: OWNER.to_string(),
        tenant_id: None,
        property_id: None,
        unit_id: None,
    }
}

#[tokio::test]
async fn test_basic_exchange() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .expect("Failed to create conversation");

    let conv = service.conversation(&conv_id).await.unwrap();
    assert!(conv.unread_counts.is_empty());
    assert_eq!(conv.last_message_preview, "Hi");
    assert_eq!(conv.status, ConversationStatus::Active);

    let messages = service.messages(&conv_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].read_by.len(), 1);
    assert_eq!(messages[0].read_by[0].user_id, OWNER);

    service
        .send_message(&conv_id, TENANT, "Thanks!", vec![])
        .await
        .unwrap();

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.unread_counts.len(), 1);
    assert_eq!(conv.unread_counts.get(OWNER), Some(&1));
    assert_eq!(conv.last_message_preview, "Thanks!");
}

#[tokio::test]
async fn test_create_conversation_requires_organization() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let mut request = owner_and_tenant("Hi");
    request.organization_id = "org-missing".to_string();

    let err = service.create_conversation(request).await.unwrap_err();
    assert!(matches!(err, MessagingError::OrganizationNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service.conversations("org-missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_seeds_sender_receipt_and_skips_sender_unread() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();

    let attachment = Attachment {
        name: "lease.pdf".to_string(),
        url: "https://files.example.com/lease.pdf".to_string(),
        storage_ref: "blob/lease".to_string(),
        mime_type: "application/pdf".to_string(),
    };
    let message_id = service
        .send_message(&conv_id, OWNER, "Lease attached", vec![attachment.clone()])
        .await
        .unwrap();

    let messages = service.messages(&conv_id).await.unwrap();
    let sent = messages.iter().find(|m| m.id == message_id).unwrap();
    assert_eq!(sent.read_by.len(), 1);
    assert_eq!(sent.read_by[0].user_id, OWNER);
    assert_eq!(sent.attachments, vec![attachment]);

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.unread_for(OWNER), 0);
    assert!(!conv.unread_counts.contains_key(OWNER));
    assert_eq!(conv.unread_for(TENANT), 1);
}

#[tokio::test]
async fn test_send_to_missing_conversation() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let err = service
        .send_message("conv-missing", OWNER, "Hello?", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::ConversationNotFound(_)));
}

#[tokio::test]
async fn test_preview_truncated_to_100_chars() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let long = "A".repeat(150);
    let conv_id = service
        .create_conversation(owner_and_tenant(&long))
        .await
        .unwrap();
    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.last_message_preview.len(), 100);

    service
        .send_message(&conv_id, TENANT, &"B".repeat(150), vec![])
        .await
        .unwrap();
    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.last_message_preview, "B".repeat(100));

    // The message itself keeps its full content
    let messages = service.messages(&conv_id).await.unwrap();
    assert_eq!(messages[1].content.len(), 150);
}

#[tokio::test]
async fn test_concurrent_sends_keep_exact_unread_counts() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();

    let sends = (0..10).map(|i| {
        let service = service.clone();
        let conv_id = conv_id.clone();
        async move {
            service
                .send_message(&conv_id, OWNER, &format!("update {}", i), vec![])
                .await
        }
    });
    let results = join_all(sends).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.unread_for(TENANT), 10);
    assert_eq!(conv.unread_for(OWNER), 0);
    assert_eq!(service.messages(&conv_id).await.unwrap().len(), 11);
}

#[tokio::test]
async fn test_mark_as_read_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    service
        .send_message(&conv_id, OWNER, "Rent is due Friday", vec![])
        .await
        .unwrap();

    service.mark_as_read(&conv_id, TENANT).await.unwrap();
    let first = service.messages(&conv_id).await.unwrap();
    assert!(first.iter().all(|m| m.is_read_by(TENANT)));
    assert_eq!(service.conversation(&conv_id).await.unwrap().unread_for(TENANT), 0);

    service.mark_as_read(&conv_id, TENANT).await.unwrap();
    let second = service.messages(&conv_id).await.unwrap();
    for message in &second {
        let receipts = message
            .read_by
            .iter()
            .filter(|r| r.user_id == TENANT)
            .count();
        assert_eq!(receipts, 1);
    }
    // Original read timestamps survive the repeat call
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_mark_as_read_by_outsider_writes_no_counter() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();

    service.mark_as_read(&conv_id, "auditor").await.unwrap();

    let conv = service.conversation(&conv_id).await.unwrap();
    assert!(conv.unread_counts.is_empty());
}

#[tokio::test]
async fn test_toggle_reaction_twice_restores_reactions() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    let message_id = service.messages(&conv_id).await.unwrap()[0].id.clone();
    service
        .add_reaction(&message_id, OWNER, "🎉")
        .await
        .unwrap();
    let before = service.messages(&conv_id).await.unwrap()[0].reactions.clone();

    let first = service
        .toggle_reaction(&message_id, TENANT, "👍")
        .await
        .unwrap();
    assert!(first.added);
    let during = &service.messages(&conv_id).await.unwrap()[0];
    assert!(during.has_reaction(TENANT, "👍"));

    let second = service
        .toggle_reaction(&message_id, TENANT, "👍")
        .await
        .unwrap();
    assert!(!second.added);

    let after = service.messages(&conv_id).await.unwrap()[0].reactions.clone();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_add_and_remove_reaction_primitives() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    let message_id = service.messages(&conv_id).await.unwrap()[0].id.clone();

    assert!(service.add_reaction(&message_id, TENANT, "👍").await.unwrap());
    assert!(!service.add_reaction(&message_id, TENANT, "👍").await.unwrap());
    assert_eq!(
        service.messages(&conv_id).await.unwrap()[0].reactions.len(),
        1
    );

    service
        .remove_reaction(&message_id, TENANT, "👍")
        .await
        .unwrap();
    // Removing again is a silent no-op
    service
        .remove_reaction(&message_id, TENANT, "👍")
        .await
        .unwrap();
    assert!(service.messages(&conv_id).await.unwrap()[0]
        .reactions
        .is_empty());

    let err = service
        .toggle_reaction("msg-missing", TENANT, "👍")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reply_threading() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Is the heating fixed?"))
        .await
        .unwrap();
    let target = service.messages(&conv_id).await.unwrap()[0].id.clone();

    let reply_id = service
        .reply_to_message(&conv_id, TENANT, "Yes, this morning", &target, vec![])
        .await
        .unwrap();

    let messages = service.messages(&conv_id).await.unwrap();
    let reply = messages.iter().find(|m| m.id == reply_id).unwrap();
    assert_eq!(reply.reply_to_id.as_deref(), Some(target.as_str()));

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.last_message_preview, "Yes, this morning");
    assert_eq!(conv.unread_for(OWNER), 1);
}

#[tokio::test]
async fn test_reply_across_conversations_is_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let first = service
        .create_conversation(owner_and_tenant("First"))
        .await
        .unwrap();
    let second = service
        .create_conversation(owner_and_tenant("Second"))
        .await
        .unwrap();
    let foreign_target = service.messages(&first).await.unwrap()[0].id.clone();

    let err = service
        .reply_to_message(&second, TENANT, "Wrong thread", &foreign_target, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::ReplyTargetWrongConversation(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
    assert_eq!(service.messages(&second).await.unwrap().len(), 1);

    let err = service
        .reply_to_message(&second, TENANT, "Nowhere", "msg-missing", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::ReplyTargetNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
    assert_eq!(service.messages(&second).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_latest_message_updates_preview() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    let older = service.messages(&conv_id).await.unwrap()[0].id.clone();
    let latest = service
        .send_message(&conv_id, OWNER, "Viewing at 5pm", vec![])
        .await
        .unwrap();

    let edited = service
        .edit_message(&latest, OWNER, "Viewing at 6pm")
        .await
        .unwrap();
    assert_eq!(edited.content, "Viewing at 6pm");
    assert!(edited.is_edited);
    assert!(edited.edited_at.is_some());
    assert_eq!(
        service
            .conversation(&conv_id)
            .await
            .unwrap()
            .last_message_preview,
        "Viewing at 6pm"
    );

    // Editing an older message leaves the preview alone
    service
        .edit_message(&older, OWNER, "Hello there")
        .await
        .unwrap();
    assert_eq!(
        service
            .conversation(&conv_id)
            .await
            .unwrap()
            .last_message_preview,
        "Viewing at 6pm"
    );
}

#[tokio::test]
async fn test_edit_and_delete_by_other_user_are_forbidden() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    let before = service.messages(&conv_id).await.unwrap()[0].clone();

    let err = service
        .edit_message(&before.id, TENANT, "Hijacked")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = service
        .delete_message(&before.id, TENANT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let after = service.messages(&conv_id).await.unwrap()[0].clone();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_delete_overwrites_content() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();
    let message_id = service
        .send_message(&conv_id, OWNER, "Door code is 4821", vec![])
        .await
        .unwrap();

    let deleted = service.delete_message(&message_id, OWNER).await.unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());
    assert_eq!(deleted.content, "This message was deleted");

    let messages = service.messages(&conv_id).await.unwrap();
    assert!(messages.iter().all(|m| !m.content.contains("4821")));

    // Deleting never touches the preview
    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.last_message_preview, "Door code is 4821");

    // A deleted message cannot be brought back by editing
    let err = service
        .edit_message(&message_id, OWNER, "Door code is 4821")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_find_or_create_returns_same_conversation() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let first = service
        .find_or_create_conversation(ORG, "tenant-x", OWNER)
        .await
        .unwrap();
    let second = service
        .find_or_create_conversation(ORG, "tenant-x", OWNER)
        .await
        .unwrap();
    assert_eq!(first, second);

    let conv = service.conversation(&first).await.unwrap();
    assert_eq!(conv.participants, vec![Participant::new(OWNER, "owner", "Ana Owner")]);
    assert_eq!(conv.tenant_id.as_deref(), Some("tenant-x"));
    assert_eq!(conv.last_message_preview, "");
    assert!(service.messages(&first).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_or_create_snapshots_tenant_placement() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, directory) = create_test_service(&temp_file).await;

    let conv_id = service
        .find_or_create_conversation(ORG, "tenant-x", OWNER)
        .await
        .unwrap();
    assert!(directory
        .move_tenant("tenant-x", Some("prop-2"), Some("unit-9"))
        .await
        .unwrap());

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.property_id.as_deref(), Some("prop-1"));
    assert_eq!(conv.unit_id.as_deref(), Some("unit-4"));
}

#[tokio::test]
async fn test_find_or_create_after_archive_starts_new_conversation() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let first = service
        .find_or_create_conversation(ORG, "tenant-x", OWNER)
        .await
        .unwrap();
    let archived = service.archive_conversation(&first).await.unwrap();
    assert_eq!(archived.status, ConversationStatus::Archived);

    let second = service
        .find_or_create_conversation(ORG, "tenant-x", OWNER)
        .await
        .unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_find_or_create_unknown_references() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let err = service
        .find_or_create_conversation(ORG, "tenant-missing", OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::TenantNotFound(_)));

    let err = service
        .find_or_create_conversation(ORG, "tenant-x", "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::UserNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_archived_conversation_still_accepts_messages() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;
    let conv_id = service
        .create_conversation(owner_and_tenant("Hi"))
        .await
        .unwrap();

    service.archive_conversation(&conv_id).await.unwrap();
    service
        .send_message(&conv_id, TENANT, "One more thing", vec![])
        .await
        .unwrap();

    let conv = service.conversation(&conv_id).await.unwrap();
    assert_eq!(conv.status, ConversationStatus::Archived);
    assert_eq!(conv.last_message_preview, "One more thing");

    let err = service
        .archive_conversation("conv-missing")
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::ConversationNotFound(_)));
}

#[tokio::test]
async fn test_conversations_ordered_by_last_activity() {
    let temp_file = NamedTempFile::new().unwrap();
    let (service, _) = create_test_service(&temp_file).await;

    let quiet = service
        .create_conversation(owner_and_tenant("Quiet"))
        .await
        .unwrap();
    let busy = service
        .create_conversation(owner_and_tenant("Busy"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service
        .send_message(&quiet, TENANT, "Bump", vec![])
        .await
        .unwrap();

    let listed = service.conversations(ORG).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![quiet.as_str(), busy.as_str()]);
}

#[tokio::test]
async fn test_open_runs_migrations() {
    let temp_file = NamedTempFile::new().unwrap();
    let service = MessagingService::open(
        &PersistenceConfig {
            db_path: temp_file.path().to_path_buf(),
            ..Default::default()
        },
        MessagingConfig::default(),
    )
    .await
    .unwrap();

    assert!(service.conversations(ORG).await.unwrap().is_empty());
    assert_eq!(service.config().preview_max_chars, 100);
}
