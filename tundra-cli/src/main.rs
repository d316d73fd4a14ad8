//! Tundra CLI
//!
//! Command-line interface for inspecting and nudging repos managed by the
//! Tundra controller.

mod commands;
mod config;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "tundractl")]
#[command(about = "Tundra continuous deployment CLI", long_about = None)]
struct Cli {
    /// Resource store URL
    #[arg(long, env = "TUNDRA_STORE_URL", default_value = "http://localhost:8080")]
    store_url: String,

    /// Pipeline engine URL
    #[arg(long, env = "TUNDRA_ENGINE_URL", default_value = "http://localhost:8081")]
    engine_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        store_url: cli.store_url,
        engine_url: cli.engine_url,
    };

    handle_command(cli.command, &config).await
}
