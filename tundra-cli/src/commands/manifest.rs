//! Manifest command handlers
//!
//! Offline helpers: nothing here talks to a service.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tundra_core::domain::manifest::PipelineConfig;
use tundra_core::generate;

/// Manifest subcommands
#[derive(Subcommand)]
pub enum ManifestCommands {
    /// Print the execution plan a manifest file generates
    Render {
        /// Path to the manifest file
        file: String,
    },
}

pub fn handle_manifest_command(command: ManifestCommands) -> Result<()> {
    match command {
        ManifestCommands::Render { file } => render_manifest(&file),
    }
}

fn render_manifest(file: &str) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read manifest file: {}", file))?;

    let (config, rendered) = render(&text)?;

    eprintln!(
        "{} {} step(s), {} strategy",
        "✓".green().bold(),
        config.steps.len(),
        format!("{:?}", config.strategy).to_lowercase()
    );
    println!("{}", rendered);

    Ok(())
}

/// Parses manifest text and renders its plan as pretty JSON
fn render(text: &str) -> Result<(PipelineConfig, String)> {
    let config = PipelineConfig::from_yaml(text).context("Failed to parse manifest")?;
    let plan = generate(&config);
    let rendered = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
    Ok((config, rendered))
}
