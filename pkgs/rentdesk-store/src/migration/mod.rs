//! Sea-ORM migrations for rentdesk-store database schema

pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_directory_tables;
mod m20260105_000002_create_conversations_table;
mod m20260105_000003_create_messages_table;
mod m20260106_000001_create_message_detail_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_directory_tables::Migration),
            Box::new(m20260105_000002_create_conversations_table::Migration),
            Box::new(m20260105_000003_create_messages_table::Migration),
            Box::new(m20260106_000001_create_message_detail_tables::Migration),
        ]
    }
}
