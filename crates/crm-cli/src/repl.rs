//! Line parsing for the interactive chat.

use std::path::PathBuf;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text for the assistant
    Say(String),
    Login,
    Logout,
    Clear,
    History,
    /// `/preset` with no name lists the presets
    Preset(Option<String>),
    /// Write the last CSV download into a directory (default: current)
    Save(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
}

/// Parse a line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(ReplCommand::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    Some(match name.to_lowercase().as_str() {
        "login" => ReplCommand::Login,
        "logout" => ReplCommand::Logout,
        "clear" => ReplCommand::Clear,
        "history" => ReplCommand::History,
        "preset" => ReplCommand::Preset(arg.map(str::to_string)),
        "save" => ReplCommand::Save(arg.map(PathBuf::from)),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other.to_string()),
    })
}

pub const HELP_TEXT: &str = "\
Commands:
  /login              log in with the configured credentials
  /logout             drop the CRM session (history is kept)
  /clear              clear the chat history
  /history            show the chat history
  /preset [name]      run a preset question, or list presets
  /save [dir]         write the last CSV download to a directory
  /help               show this help
  /quit               leave
Anything else is sent to the assistant. SOQL statements run as-is.";
