//! CLI argument definitions using clap
//!
//! Commands:
//! - campus serve [--config <path>]
//! - campus migrate [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// campus - school management backend
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply migrations and start the HTTP server
    Serve {
        /// Path to a TOML configuration file (default: ./campus.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to a TOML configuration file (default: ./campus.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Serve { config } | Command::Migrate { config } => config.as_ref(),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
