//! CLI argument parsing for the CRM assistant.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CRM Assistant
///
/// Ask questions about Salesforce accounts, opportunities and contacts in
/// plain language.
#[derive(Parser, Debug)]
#[command(name = "crm-assistant")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/crm-assistant/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Assistant commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and print the result
    Ask {
        /// Question or SOQL statement
        text: String,

        /// Write the CSV download into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Print the flattened rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show how a question would be classified, without querying the CRM
    Classify {
        /// Question to classify
        text: String,

        /// Use the generative classifier if a model is available
        #[arg(long)]
        ai: bool,
    },

    /// List every intent with its canonical query
    Templates,

    /// List classifier models and show which one probing selects
    Models,
}
