//! Conversation controller.
//!
//! Owns the session and the pipeline, and drives the state transitions the
//! presentation layer asks for: login, logout, clear, submit.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crm_intent::{AiResolver, Classifier, GenerativeService, ModelSelector};
use crm_query::{AuthError, Authenticator, Credentials, QueryExecutor};
use crm_types::{AssistantError, ChatMessage};

use crate::pipeline::{QueryPipeline, TurnOutcome};
use crate::presets::Preset;
use crate::session::{ClassifierState, Session};

/// Generative service plus the model preferences to probe it with.
struct ModelSource {
    service: Arc<dyn GenerativeService>,
    selector: ModelSelector,
}

/// A single conversation with the assistant.
pub struct Conversation {
    session: Session,
    pipeline: QueryPipeline,
    authenticator: Arc<dyn Authenticator>,
    models: Option<ModelSource>,
}

impl Conversation {
    /// A conversation that classifies with the keyword rules until a
    /// generative service is attached.
    pub fn new(executor: QueryExecutor, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            session: Session::new(),
            pipeline: QueryPipeline::new(Classifier::rule_based(), executor),
            authenticator,
            models: None,
        }
    }

    /// Attach a generative service to probe at initialization.
    pub fn with_generative_service(
        mut self,
        service: Arc<dyn GenerativeService>,
        selector: ModelSelector,
    ) -> Self {
        self.models = Some(ModelSource { service, selector });
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn classifier(&self) -> &Classifier {
        self.pipeline.classifier()
    }

    /// Probe for a classifier model. Runs at most once per session; later
    /// calls return the cached outcome.
    ///
    /// Returns true if the AI tier is active.
    pub async fn initialize_classifier(&mut self) -> bool {
        if *self.session.classifier_state() != ClassifierState::Uninitialized {
            return self.session.classifier_available();
        }

        let handle = match &self.models {
            Some(source) => {
                source
                    .selector
                    .select(Arc::clone(&source.service))
                    .instrument(info_span!("probe", session_id = %self.session.id()))
                    .await
            }
            None => None,
        };

        match handle {
            Some(handle) => {
                let model = handle.model().to_string();
                self.pipeline
                    .set_classifier(Classifier::AiAssisted(AiResolver::new(handle)));
                self.session
                    .set_classifier_state(ClassifierState::Ready { model });
                true
            }
            None => {
                info!(session_id = %self.session.id(), "Using rule-based classification");
                self.session.set_classifier_state(ClassifierState::Unavailable);
                false
            }
        }
    }

    /// Log in. On success the welcome message is appended and returned.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<ChatMessage, AuthError> {
        self.initialize_classifier().await;
        self.session.begin_login();

        match self.authenticator.login(credentials).await {
            Ok(crm) => Ok(self.session.complete_login(crm)),
            Err(e) => {
                warn!(session_id = %self.session.id(), error = %e, "Login failed");
                self.session.fail_login();
                Err(e)
            }
        }
    }

    /// Drop the CRM session. Returns true if one was active.
    pub fn logout(&mut self) -> bool {
        self.session.logout()
    }

    pub fn clear_history(&mut self) {
        self.session.clear_history();
    }

    /// Submit user text and run one turn.
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome, AssistantError> {
        let span = info_span!("turn", session_id = %self.session.id());
        self.pipeline
            .run_turn(&mut self.session, text)
            .instrument(span)
            .await
    }

    /// Submit a preset's phrasing.
    pub async fn run_preset(&mut self, preset: Preset) -> Result<TurnOutcome, AssistantError> {
        self.submit(preset.phrasing()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    use crm_intent::MockGenerativeService;
    use crm_query::{MockAuthenticator, MockCrmService};
    use crm_types::Intent;

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "ops@example.com".to_string(),
            password: SecretString::from(password.to_string()),
            security_token: None,
            client_id: "id".to_string(),
            client_secret: SecretString::from("secret"),
        }
    }

    fn conversation(service: Arc<MockCrmService>) -> Conversation {
        Conversation::new(
            QueryExecutor::new(service),
            Arc::new(MockAuthenticator::new("pw")),
        )
    }

    #[tokio::test]
    async fn test_initialize_without_service_is_unavailable() {
        let mut conversation = conversation(Arc::new(MockCrmService::new()));
        assert!(!conversation.initialize_classifier().await);
        assert_eq!(
            conversation.session().classifier_state(),
            &ClassifierState::Unavailable
        );
        assert!(!conversation.classifier().is_ai_assisted());
    }

    #[tokio::test]
    async fn test_initialize_probes_once() {
        let service = Arc::new(MockGenerativeService::default().with_working_model("gemini-pro"));
        let mut conversation = conversation(Arc::new(MockCrmService::new()))
            .with_generative_service(
                service.clone(),
                ModelSelector::new(vec!["gemini-1.5-pro".into(), "gemini-pro".into()]),
            );

        assert!(conversation.initialize_classifier().await);
        assert!(conversation.initialize_classifier().await);
        assert_eq!(service.probed_models(), vec!["gemini-1.5-pro", "gemini-pro"]);
        assert_eq!(
            conversation.session().classifier_state(),
            &ClassifierState::Ready {
                model: "gemini-pro".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unavailable_service_stays_unavailable() {
        let service = Arc::new(MockGenerativeService::unavailable());
        let mut conversation = conversation(Arc::new(MockCrmService::new()))
            .with_generative_service(service.clone(), ModelSelector::new(vec!["gemini-pro".into()]));

        assert!(!conversation.initialize_classifier().await);
        assert!(!conversation.initialize_classifier().await);
        assert_eq!(service.probed_models().len(), 1);
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let service = Arc::new(MockCrmService::new().with_records(vec![
            json!({"Id": "003A", "Name": "Ada"}),
        ]));
        let mut conversation = conversation(service);

        assert!(conversation.login(&credentials("wrong")).await.is_err());
        assert!(!conversation.session().is_authenticated());
        assert!(conversation.session().messages().is_empty());

        let welcome = conversation.login(&credentials("pw")).await.unwrap();
        assert!(welcome.content.contains("simple query mode"));

        let outcome = conversation.run_preset(Preset::Contacts).await.unwrap();
        assert_eq!(outcome.classification.intent, Intent::Contacts);
        assert_eq!(conversation.session().messages().len(), 3);

        assert!(conversation.logout());
        assert_eq!(conversation.session().messages().len(), 3);
        let err = conversation.submit("List contacts").await.unwrap_err();
        assert!(matches!(err, AssistantError::NotAuthenticated));

        conversation.clear_history();
        assert!(conversation.session().messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_session() {
        let service = Arc::new(MockCrmService::new().with_records(vec![
            json!({"Id": "003A", "Name": "Ada"}),
        ]));
        let mut conversation = conversation(service);
        conversation.login(&credentials("pw")).await.unwrap();

        assert!(conversation.login(&credentials("wrong")).await.is_err());
        assert!(conversation.session().is_authenticated());
        assert_eq!(conversation.session().messages().len(), 1);

        let outcome = conversation.submit("List contacts").await.unwrap();
        assert_eq!(outcome.classification.intent, Intent::Contacts);
    }
}
