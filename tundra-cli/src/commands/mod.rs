//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod manifest;
mod repo;

pub use manifest::ManifestCommands;
pub use repo::RepoCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Managed repository operations
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
    /// Work with manifest files locally
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Repo { command } => repo::handle_repo_command(command, config).await,
        Commands::Manifest { command } => manifest::handle_manifest_command(command),
    }
}
