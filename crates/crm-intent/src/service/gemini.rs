//! Google Generative Language (Gemini) REST client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crm_types::ClassifierSettings;

use super::{GenerativeService, ServiceError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiServiceConfig {
    /// API base URL (e.g., "https://generativelanguage.googleapis.com/v1beta")
    pub base_url: String,

    /// API key
    pub api_key: SecretString,

    /// Transport timeout
    pub timeout: Duration,
}

impl GeminiServiceConfig {
    /// Create config for the public Gemini endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(60),
        }
    }

    /// Point the client at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from loaded settings. Fails if no API key is configured.
    pub fn from_settings(
        settings: &ClassifierSettings,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServiceError::Config("classifier.api_key is not set".to_string()))?;

        let mut config = Self::new(api_key).with_timeout(timeout);
        if let Some(base_url) = &settings.api_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }
}

/// Gemini implementation of [`GenerativeService`].
pub struct GeminiService {
    client: Client,
    config: GeminiServiceConfig,
}

impl GeminiService {
    /// Create a new Gemini client.
    pub fn new(config: GeminiServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// "models/gemini-pro" and "gemini-pro" address the same resource.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        if response.status() == 429 {
            return Err(ServiceError::RateLimitExceeded);
        }

        if response.status() == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::NoModel(body));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeService for GeminiService {
    async fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        #[derive(Deserialize)]
        struct ListModelsResponse {
            #[serde(default)]
            models: Vec<ModelEntry>,
        }

        #[derive(Deserialize)]
        struct ModelEntry {
            name: String,
        }

        let url = format!("{}/models", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ServiceError::Api(e.to_string()))?;

        let response_body: ListModelsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(response_body.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        #[derive(Serialize)]
        struct GenerateRequest {
            contents: Vec<Content>,
        }

        #[derive(Serialize)]
        struct Content {
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url,
            Self::model_path(model)
        );
        debug!(model = model, "Calling generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Api(e.to_string()))?;

        let response_body: GenerateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        response_body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| ServiceError::Parse("No candidates in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> GeminiService {
        GeminiService::new(GeminiServiceConfig::new("test-key").with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_model_path() {
        assert_eq!(GeminiService::model_path("gemini-pro"), "models/gemini-pro");
        assert_eq!(GeminiService::model_path("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = ClassifierSettings::default();
        let result = GeminiServiceConfig::from_settings(&settings, Duration::from_secs(5));
        assert!(matches!(result, Err(ServiceError::Config(_))));

        let settings = ClassifierSettings {
            api_key: Some("k".into()),
            api_base_url: Some("http://localhost:9/".into()),
            ..Default::default()
        };
        let config = GeminiServiceConfig::from_settings(&settings, Duration::from_secs(5)).unwrap();
        assert_eq!(config.base_url, "http://localhost:9");
    }

    #[tokio::test]
    async fn test_generate_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"intent\": "}, {"text": "\"contacts\"}"}]}}]
            })))
            .mount(&server)
            .await;

        let text = service_for(&server)
            .generate("gemini-1.5-pro", "hi")
            .await
            .unwrap();
        assert_eq!(text, "{\"intent\": \"contacts\"}");
    }

    #[tokio::test]
    async fn test_generate_maps_status_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/missing:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/busy:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let service = service_for(&server);
        assert!(matches!(
            service.generate("missing", "hi").await,
            Err(ServiceError::NoModel(_))
        ));
        assert!(matches!(
            service.probe("busy").await,
            Err(ServiceError::RateLimitExceeded)
        ));
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "models/gemini-1.5-flash"}, {"name": "models/embedding-001"}]
            })))
            .mount(&server)
            .await;

        let models = service_for(&server).list_models().await.unwrap();
        assert_eq!(models, vec!["models/gemini-1.5-flash", "models/embedding-001"]);
    }
}
