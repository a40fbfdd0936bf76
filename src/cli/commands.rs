//! CLI command implementations
//!
//! Both commands load configuration the same way: defaults, then the TOML
//! file, then `CAMPUS_*` environment variables (after reading `.env`).
//! `migrate` only requires a usable database section.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;
use crate::http_server::{AppState, HttpServer};

use super::args::Command;
use super::errors::CliResult;

/// Run a parsed command to completion
pub async fn run_command(command: Command) -> CliResult<()> {
    let path = command.config_path().map(|p| p.as_path());
    match command {
        Command::Serve { .. } => serve(AppConfig::load_with_dotenv(path)?).await,
        Command::Migrate { .. } => migrate(&AppConfig::load_database_with_dotenv(path)?).await,
    }
}

/// Connect, migrate, then serve until the process is stopped
pub async fn serve(config: AppConfig) -> CliResult<()> {
    let db = open_database(&config).await?;
    let state = Arc::new(AppState::new(db, config));
    let server = HttpServer::new(state);
    tracing::info!(addr = %server.socket_addr(), "starting campus server");
    server.start().await?;
    Ok(())
}

/// Apply pending migrations and exit
pub async fn migrate(config: &AppConfig) -> CliResult<()> {
    open_database(config).await?;
    Ok(())
}

async fn open_database(config: &AppConfig) -> CliResult<Database> {
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    Ok(db)
}
