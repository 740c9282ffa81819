use anyhow::bail;
use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StoreBackend};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending SQL migrations")]
    Migrate,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate => {
            if config.database.backend == StoreBackend::Memory {
                bail!("The in-memory store has no schema to migrate; set STORE_BACKEND=postgres");
            }

            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            pool.close().await;

            output_success(&output_format, "Migrations applied", None)
        }
    }
}
