use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum MessageAttachments {
    Table,
    Id,
    MessageId,
    Position,
    Name,
    Url,
    StorageRef,
    MimeType,
}

#[derive(DeriveIden)]
enum MessageReactions {
    Table,
    Id,
    MessageId,
    UserId,
    Emoji,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReadReceipts {
    Table,
    Id,
    MessageId,
    UserId,
    ReadAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260106_000001_create_message_detail_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MessageAttachments::Table)
                    .col(
                        ColumnDef::new(MessageAttachments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageAttachments::MessageId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageAttachments::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MessageAttachments::Name).string().not_null())
                    .col(ColumnDef::new(MessageAttachments::Url).string().not_null())
                    .col(
                        ColumnDef::new(MessageAttachments::StorageRef)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MessageAttachments::MimeType)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachments_message")
                            .from(MessageAttachments::Table, MessageAttachments::MessageId)
                            .to(Messages::Table, Messages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MessageReactions::Table)
                    .col(
                        ColumnDef::new(MessageReactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MessageReactions::MessageId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MessageReactions::UserId).string().not_null())
                    .col(ColumnDef::new(MessageReactions::Emoji).string().not_null())
                    .col(
                        ColumnDef::new(MessageReactions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_message")
                            .from(MessageReactions::Table, MessageReactions::MessageId)
                            .to(Messages::Table, Messages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reaction per (message, user, emoji)
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_unique")
                    .table(MessageReactions::Table)
                    .col(MessageReactions::MessageId)
                    .col(MessageReactions::UserId)
                    .col(MessageReactions::Emoji)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReadReceipts::Table)
                    .col(
                        ColumnDef::new(ReadReceipts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReadReceipts::MessageId).string().not_null())
                    .col(ColumnDef::new(ReadReceipts::UserId).string().not_null())
                    .col(ColumnDef::new(ReadReceipts::ReadAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_read_receipts_message")
                            .from(ReadReceipts::Table, ReadReceipts::MessageId)
                            .to(Messages::Table, Messages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One receipt per (message, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_read_receipts_unique")
                    .table(ReadReceipts::Table)
                    .col(ReadReceipts::MessageId)
                    .col(ReadReceipts::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReadReceipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MessageReactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MessageAttachments::Table).to_owned())
            .await
    }
}
