//! Command implementations for the CRM assistant.
//!
//! Handles:
//! - chat: interactive session with slash commands
//! - ask: one authenticated turn
//! - classify: classification only, no CRM access
//! - templates / models: introspection

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufReadExt};
use tracing::{info, warn};

use crm_intent::{
    all_templates, AiResolver, Classifier, GeminiService, GeminiServiceConfig, GenerativeService,
    ModelSelector,
};
use crm_query::{Credentials, QueryExecutor, SalesforceAuthenticator, SalesforceClient};
use crm_service::{Conversation, Preset, PresentationEvent, TurnOutcome};
use crm_types::{AssistantError, Intent, Settings};

use crate::render::{format_event, format_message};
use crate::repl::{parse_line, ReplCommand, HELP_TEXT};

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(config_path: Option<&str>, log_level_override: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the tracing subscriber. Logs go to stderr so they never mix with
/// the transcript on stdout.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn http_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.http_timeout_secs)
}

/// Build the configured generative service, if any.
fn generative_service(settings: &Settings) -> Option<Arc<dyn GenerativeService>> {
    let classifier = &settings.classifier;
    if !classifier.enabled {
        info!("Generative classifier disabled in configuration");
        return None;
    }
    if !classifier.provider.eq_ignore_ascii_case("gemini") {
        warn!(provider = %classifier.provider, "Unsupported classifier provider");
        return None;
    }

    let service = GeminiServiceConfig::from_settings(classifier, http_timeout(settings))
        .and_then(GeminiService::new);
    match service {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            warn!(error = %e, "Generative classifier not configured");
            None
        }
    }
}

fn model_selector(settings: &Settings) -> ModelSelector {
    ModelSelector::new(settings.classifier.models.clone())
        .with_prefer_listed(settings.classifier.prefer_listed_models)
}

/// Wire a conversation to the real Salesforce and Gemini endpoints.
fn build_conversation(settings: &Settings) -> Result<Conversation> {
    let timeout = http_timeout(settings);
    let client = SalesforceClient::new(settings.salesforce.api_version.clone(), timeout)
        .context("Failed to create Salesforce client")?;
    let authenticator = SalesforceAuthenticator::new(settings.salesforce.login_url.clone(), timeout)
        .context("Failed to create Salesforce authenticator")?;

    let mut conversation = Conversation::new(
        QueryExecutor::new(Arc::new(client)),
        Arc::new(authenticator),
    );
    if let Some(service) = generative_service(settings) {
        conversation = conversation.with_generative_service(service, model_selector(settings));
    }
    Ok(conversation)
}

async fn login(conversation: &mut Conversation, settings: &Settings) -> Result<()> {
    let credentials = Credentials::from_settings(&settings.salesforce)?;
    let welcome = conversation.login(&credentials).await?;
    println!("{}", format_message(&welcome));
    Ok(())
}

/// Write a CSV download into `dir`, returning the path written.
pub fn write_download(dir: &Path, file_name: &str, csv: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Print a turn's events. Returns the download, if one was offered.
fn print_outcome(outcome: &TurnOutcome, json: bool) -> Option<(String, String)> {
    let mut download = None;
    for event in &outcome.events {
        if let Some(text) = format_event(event, json) {
            println!("{}\n", text);
        }
        if let PresentationEvent::Download { file_name, csv } = event {
            println!("Download available: {} (use /save or --csv-dir)\n", file_name);
            download = Some((file_name.clone(), csv.clone()));
        }
    }
    download
}

/// Interactive chat.
pub async fn run_chat(config_path: Option<&str>, log_level: Option<&str>) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    let mut conversation = build_conversation(&settings)?;
    if conversation.initialize_classifier().await {
        println!("Classifier: {}", conversation.classifier().describe());
    } else {
        println!("Classifier: rule-based (simple query mode)");
    }

    if settings.salesforce.has_credentials() {
        if let Err(e) = login(&mut conversation, &settings).await {
            println!("Login failed: {:#}", e);
        }
    } else {
        println!("No Salesforce credentials configured. Set CRM_SALESFORCE__* and use /login.");
    }
    println!("{}\n", HELP_TEXT);

    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut last_download: Option<(String, String)> = None;

    loop {
        print!("You: ");
        {
            use std::io::Write;
            std::io::stdout().flush().ok();
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };

        let turn = match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{}\n", HELP_TEXT);
                continue;
            }
            ReplCommand::Login => {
                if let Err(e) = login(&mut conversation, &settings).await {
                    println!("Login failed: {:#}\n", e);
                }
                continue;
            }
            ReplCommand::Logout => {
                if conversation.logout() {
                    println!("Logged out. History is kept; /clear to drop it.\n");
                } else {
                    println!("Not logged in.\n");
                }
                continue;
            }
            ReplCommand::Clear => {
                conversation.clear_history();
                last_download = None;
                println!("Chat history cleared.\n");
                continue;
            }
            ReplCommand::History => {
                let messages = conversation.session().messages();
                if messages.is_empty() {
                    println!("No conversation history.\n");
                }
                for message in messages {
                    println!("{}", format_message(message));
                }
                continue;
            }
            ReplCommand::Save(dir) => {
                match &last_download {
                    Some((file_name, csv)) => {
                        let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                        match write_download(&dir, file_name, csv) {
                            Ok(path) => println!("Saved {}\n", path.display()),
                            Err(e) => println!("{:#}\n", e),
                        }
                    }
                    None => println!("Nothing to save yet.\n"),
                }
                continue;
            }
            ReplCommand::Preset(None) => {
                for preset in Preset::ALL {
                    println!("  {:<24} {}", preset.name(), preset.phrasing());
                }
                println!();
                continue;
            }
            ReplCommand::Preset(Some(name)) => match name.parse::<Preset>() {
                Ok(preset) => conversation.run_preset(preset).await,
                Err(e) => {
                    println!("{}\n", e);
                    continue;
                }
            },
            ReplCommand::Unknown(name) => {
                println!("Unknown command /{}. Type /help.\n", name);
                continue;
            }
            ReplCommand::Say(text) => conversation.submit(&text).await,
        };

        match turn {
            Ok(outcome) => {
                if let Some(download) = print_outcome(&outcome, false) {
                    last_download = Some(download);
                }
            }
            Err(AssistantError::NotAuthenticated) => {
                println!("Not logged in. Use /login first.\n")
            }
            Err(e) => println!("{}\n", e),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// One authenticated turn.
pub async fn run_ask(
    config_path: Option<&str>,
    log_level: Option<&str>,
    text: &str,
    csv_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    let mut conversation = build_conversation(&settings)?;
    conversation.initialize_classifier().await;
    login(&mut conversation, &settings).await?;

    let outcome = conversation.submit(text).await?;
    let download = print_outcome(&outcome, json);

    if let (Some(dir), Some((file_name, csv))) = (csv_dir, download) {
        let path = write_download(dir, &file_name, &csv)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Classification only.
pub async fn run_classify(
    config_path: Option<&str>,
    log_level: Option<&str>,
    text: &str,
    ai: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    let mut classifier = Classifier::rule_based();
    if ai {
        match generative_service(&settings) {
            Some(service) => match model_selector(&settings).select(service).await {
                Some(handle) => classifier = Classifier::AiAssisted(AiResolver::new(handle)),
                None => println!("No classifier model available, using rules."),
            },
            None => println!("No generative classifier configured, using rules."),
        }
    }

    let result = classifier.classify(text).await;
    println!("Tier:        {}", classifier.describe());
    println!("Intent:      {}", result.intent);
    println!("Explanation: {}", result.explanation);
    match &result.query {
        Some(query) => println!("Query:       {}", query),
        None => println!("Query:       (none)"),
    }
    Ok(())
}

/// Print every intent with its canonical query.
pub fn show_templates() -> Result<()> {
    for (intent, query) in all_templates() {
        println!("{:<26} {}", intent.as_str(), query);
    }
    for intent in Intent::ALL.iter().filter(|i| !i.has_template()) {
        println!("{:<26} (no template)", intent.as_str());
    }
    Ok(())
}

/// List models and show which one probing would select.
pub async fn show_models(config_path: Option<&str>, log_level: Option<&str>) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    let Some(service) = generative_service(&settings) else {
        println!("No generative classifier configured (set CRM_CLASSIFIER__API_KEY).");
        return Ok(());
    };

    let listed = match service.list_models().await {
        Ok(models) => models,
        Err(e) => {
            println!("Could not list models: {}", e);
            Vec::new()
        }
    };
    for model in &listed {
        println!("  {}", model);
    }

    let selector = model_selector(&settings);
    println!("Probe order: {}", selector.candidates(&listed).join(", "));
    match selector.select(service).await {
        Some(handle) => println!("Selected: {}", handle.model()),
        None => println!("Selected: none (rule-based classification)"),
    }
    Ok(())
}
