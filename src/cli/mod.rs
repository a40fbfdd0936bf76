//! CLI module for campus
//!
//! Provides command-line interface for:
//! - serve: Migrate the database and run the HTTP server
//! - migrate: Apply pending migrations and exit

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{migrate, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command).await
}
