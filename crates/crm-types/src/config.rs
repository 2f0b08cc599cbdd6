//! Configuration loading for the CRM assistant.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/crm-assistant/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::error::AssistantError;

/// Salesforce connection settings.
///
/// Credentials are normally supplied through `CRM_SALESFORCE__*` env vars
/// rather than the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesforceSettings {
    /// Login host for the OAuth token endpoint
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// REST API version segment (e.g. "v60.0")
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Appended to the password for the password grant
    #[serde(default)]
    pub security_token: Option<String>,

    /// Connected app consumer key
    #[serde(default)]
    pub client_id: Option<String>,

    /// Connected app consumer secret
    #[serde(default)]
    pub client_secret: Option<String>,
}

fn default_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_api_version() -> String {
    "v60.0".to_string()
}

impl Default for SalesforceSettings {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            api_version: default_api_version(),
            username: None,
            password: None,
            security_token: None,
            client_id: None,
            client_secret: None,
        }
    }
}

impl SalesforceSettings {
    /// Returns true if enough is configured to attempt a password-grant login.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
            && self.password.is_some()
            && self.client_id.is_some()
            && self.client_secret.is_some()
    }
}

/// Generative classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Set to false to force rule-based classification
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Provider name (only "gemini" is supported)
    #[serde(default = "default_classifier_provider")]
    pub provider: String,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Ordered model preference list probed at session start.
    /// Accepts a list or a comma-separated string (as env vars provide).
    #[serde(
        default = "default_classifier_models",
        deserialize_with = "deserialize_model_list"
    )]
    pub models: Vec<String>,

    /// Try listed "gemini" models ahead of the preference list
    #[serde(default = "default_true")]
    pub prefer_listed_models: bool,
}

fn default_true() -> bool {
    true
}

fn default_classifier_provider() -> String {
    "gemini".to_string()
}

/// Default model preference order.
pub fn default_classifier_models() -> Vec<String> {
    [
        "gemini-1.5-pro",
        "gemini-1.5-flash",
        "gemini-pro",
        "gemini-1.0-pro",
        "models/gemini-pro",
        "models/gemini-1.5-pro",
        "text-bison",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelList {
    Many(Vec<String>),
    CommaSeparated(String),
}

fn deserialize_model_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let models = match ModelList::deserialize(deserializer)? {
        ModelList::Many(models) => models,
        ModelList::CommaSeparated(list) => list.split(',').map(str::to_string).collect(),
    };
    Ok(models
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect())
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_classifier_provider(),
            api_key: None,
            api_base_url: None,
            models: default_classifier_models(),
            prefer_listed_models: true,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Transport timeout for outbound HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// CRM connection
    #[serde(default)]
    pub salesforce: SalesforceSettings,

    /// Generative classifier
    #[serde(default)]
    pub classifier: ClassifierSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            http_timeout_secs: default_http_timeout_secs(),
            salesforce: SalesforceSettings::default(),
            classifier: ClassifierSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/crm-assistant/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (CRM_*, nested keys split on "__")
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, AssistantError> {
        let default_config_path = default_config_dir().join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .set_default("http_timeout_secs", default_http_timeout_secs() as i64)
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .set_default("salesforce.login_url", default_login_url())
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .set_default("salesforce.api_version", default_api_version())
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .set_default("classifier.provider", default_classifier_provider())
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .set_default("classifier.models", default_classifier_models())
            .map_err(|e| AssistantError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // e.g. CRM_LOG_LEVEL, CRM_SALESFORCE__USERNAME, CRM_CLASSIFIER__API_KEY.
        // No type coercion: secret values must pass through verbatim.
        builder = builder.add_source(
            Environment::with_prefix("CRM")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder
            .build()
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AssistantError::Config(e.to_string()))
    }
}

/// Directory holding the default config file.
pub fn default_config_dir() -> PathBuf {
    ProjectDirs::from("", "", "crm-assistant")
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
