mod cli;

use crate::cli::{Cli, Direction};
use anyhow::Context;
use clap::Parser;
use shortlink_storage::{SqliteRepository, SqliteSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();

    shortlink_telemetry::init(config.env).context("failed to initialise tracing")?;

    info!(
        env = %config.env,
        storage_path = %config.storage_path,
        direction = %config.direction,
        "starting migrator"
    );

    let settings = SqliteSettings::builder()
        .path(config.storage_path.clone())
        .max_connections(1)
        .build();
    let repository = SqliteRepository::connect(&settings)
        .await
        .with_context(|| format!("failed to open database at {}", config.storage_path))?;

    let result = match config.direction {
        Direction::Up => repository.migrate().await,
        Direction::Down => repository.undo_migrations().await,
    };
    repository.close().await;
    result.context("failed to apply migrations")?;

    info!("migrations completed successfully");
    Ok(())
}
