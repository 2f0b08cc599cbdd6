//! CRM assistant CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (chat, ask, classify, templates, models)
//! - `render`: Terminal tables, bar charts and transcript lines
//! - `repl`: Slash-command parsing for the interactive chat

pub mod cli;
pub mod commands;
pub mod render;
pub mod repl;

pub use cli::{Cli, Commands};
pub use commands::{run_ask, run_chat, run_classify, show_models, show_templates};
