mod cli;
mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rentdesk_messaging::{MessagingConfig, MessagingService};
use rentdesk_store::{connect, DirectoryStore, PersistenceConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let db = connect(&PersistenceConfig {
        db_path: cli.db.clone(),
        ..Default::default()
    })
    .await?;
    let directory = DirectoryStore::new(db.clone());
    let service = MessagingService::new(
        db,
        Arc::new(directory.clone()),
        MessagingConfig::default(),
    );

    debug!("Running {:?}", cli.command);
    let output = commands::run(cli.command, &service, &directory).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
