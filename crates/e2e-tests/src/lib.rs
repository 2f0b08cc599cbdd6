//! End-to-end test infrastructure for the CRM assistant.
//!
//! Provides a shared TestHarness that stands up HTTP mocks of the Salesforce
//! and Gemini APIs and wires a real `Conversation` to them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crm_intent::{GeminiService, GeminiServiceConfig, ModelSelector};
use crm_query::{Credentials, QueryExecutor, SalesforceAuthenticator, SalesforceClient};
use crm_service::Conversation;
use crm_types::{SalesforceSettings, Settings};

/// API version the harness serves.
pub const API_VERSION: &str = "v60.0";

/// Password the mock token endpoint accepts.
pub const PASSWORD: &str = "correct-horse";

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Salesforce login and REST endpoints
    pub crm: MockServer,
    /// Gemini endpoints
    pub gemini: MockServer,
}

impl TestHarness {
    /// Start both mock servers. The token endpoint is mounted; nothing else is.
    pub async fn start() -> Self {
        let crm = MockServer::start().await;
        let gemini = MockServer::start().await;

        let harness = Self { crm, gemini };
        harness.mount_login().await;
        harness
    }

    /// Settings pointing at the mock servers.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.http_timeout_secs = 5;
        settings.salesforce = SalesforceSettings {
            login_url: self.crm.uri(),
            api_version: API_VERSION.to_string(),
            username: Some("ops@example.com".to_string()),
            password: Some(PASSWORD.to_string()),
            security_token: None,
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
        };
        settings.classifier.api_key = Some("test-key".to_string());
        settings.classifier.api_base_url = Some(self.gemini.uri());
        settings.classifier.models = vec!["gemini-1.5-pro".to_string(), "gemini-pro".to_string()];
        settings.classifier.prefer_listed_models = false;
        settings
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::from_settings(&self.settings().salesforce).expect("credentials")
    }

    /// A conversation against the mocks. With `with_ai` the Gemini mock is
    /// attached and probed; otherwise classification is rule-based.
    pub fn conversation(&self, with_ai: bool) -> Conversation {
        let settings = self.settings();
        let timeout = Duration::from_secs(settings.http_timeout_secs);

        let client = SalesforceClient::new(API_VERSION, timeout).expect("client");
        let authenticator =
            SalesforceAuthenticator::new(self.crm.uri(), timeout).expect("authenticator");
        let conversation = Conversation::new(
            QueryExecutor::new(Arc::new(client)),
            Arc::new(authenticator),
        );
        if !with_ai {
            return conversation;
        }

        let config = GeminiServiceConfig::from_settings(&settings.classifier, timeout)
            .expect("gemini config");
        let service = GeminiService::new(config).expect("gemini service");
        conversation.with_generative_service(
            Arc::new(service),
            ModelSelector::new(settings.classifier.models.clone()).with_prefer_listed(false),
        )
    }

    /// A conversation that is already logged in.
    pub async fn logged_in(&self, with_ai: bool) -> Conversation {
        let mut conversation = self.conversation(with_ai);
        conversation
            .login(&self.credentials())
            .await
            .expect("login against mock");
        conversation
    }

    async fn mount_login(&self) {
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(wiremock::matchers::body_string_contains(format!(
                "password={}",
                PASSWORD
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "00Dxx!session",
                "instance_url": self.crm.uri(),
                "token_type": "Bearer"
            })))
            .with_priority(1)
            .mount(&self.crm)
            .await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "authentication failure"
            })))
            .mount(&self.crm)
            .await;
    }

    /// Serve `records` for exactly `soql`.
    pub async fn mount_query(&self, soql: &str, records: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/services/data/{}/query", API_VERSION)))
            .and(query_param("q", soql))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalSize": records.len(),
                "done": true,
                "records": records
            })))
            .mount(&self.crm)
            .await;
    }

    /// Fail every query with a Salesforce error body.
    pub async fn mount_query_error(&self, status: u16, error_code: &str, message: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/services/data/{}/query", API_VERSION)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!([
                {"message": message, "errorCode": error_code}
            ])))
            .mount(&self.crm)
            .await;
    }

    /// Make `model` answer the probe prompt.
    pub async fn mount_model(&self, model: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .and(body_json(json!({"contents": [{"parts": [{"text": "Hello"}]}]})))
            .respond_with(gemini_reply("Hello! How can I help?"))
            .with_priority(1)
            .mount(&self.gemini)
            .await;
    }

    /// Reply to classification prompts for `model` with `text`.
    pub async fn mount_classification(&self, model: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(gemini_reply(text))
            .mount(&self.gemini)
            .await;
    }

    /// Fail every generation call with `status`.
    pub async fn mount_generation_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(status).set_body_string("unavailable"))
            .with_priority(10)
            .mount(&self.gemini)
            .await;
    }
}

/// A Gemini generateContent response carrying `text`.
pub fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    }))
}

/// Grouped top-accounts records as Salesforce returns them.
pub fn top_account_records() -> Vec<Value> {
    vec![
        json!({"attributes": {"type": "AggregateResult"}, "AccountId": "001A", "Name": "Acme", "totalAmount": 250000.0}),
        json!({"attributes": {"type": "AggregateResult"}, "AccountId": "001B", "Name": "Globex", "totalAmount": 410000.0}),
        json!({"attributes": {"type": "AggregateResult"}, "AccountId": "001C", "Name": "Initech", "totalAmount": 90000.0}),
    ]
}

/// Contact records with a nested account relationship.
pub fn contact_records() -> Vec<Value> {
    vec![
        json!({
            "attributes": {"type": "Contact", "url": "/services/data/v60.0/sobjects/Contact/003A"},
            "Id": "003A",
            "Name": "Ada Lovelace",
            "Email": "ada@acme.test",
            "Phone": null,
            "Account": {"attributes": {"type": "Account"}, "Name": "Acme"}
        }),
        json!({
            "attributes": {"type": "Contact", "url": "/services/data/v60.0/sobjects/Contact/003B"},
            "Id": "003B",
            "Name": "Grace Hopper",
            "Email": "grace@globex.test",
            "Phone": "555-0100",
            "Account": {"attributes": {"type": "Account"}, "Name": "Globex"}
        }),
    ]
}
