//! CRM Assistant
//!
//! Ask questions about Salesforce data in plain language.
//!
//! # Usage
//!
//! ```bash
//! crm-assistant chat
//! crm-assistant ask "Show me top accounts" [--csv-dir DIR] [--json]
//! crm-assistant classify "List contacts" [--ai]
//! crm-assistant templates
//! crm-assistant models
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/crm-assistant/config.toml)
//! 3. Environment variables (CRM_*, e.g. CRM_SALESFORCE__USERNAME)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use crm_cli::{run_ask, run_chat, run_classify, show_models, show_templates, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Chat => {
            run_chat(config, log_level).await?;
        }
        Commands::Ask {
            text,
            csv_dir,
            json,
        } => {
            run_ask(config, log_level, &text, csv_dir.as_deref(), json).await?;
        }
        Commands::Classify { text, ai } => {
            run_classify(config, log_level, &text, ai).await?;
        }
        Commands::Templates => {
            show_templates()?;
        }
        Commands::Models => {
            show_models(config, log_level).await?;
        }
    }

    Ok(())
}
