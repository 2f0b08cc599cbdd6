//! The turn pipeline: classify, execute, present.
//!
//! UI-agnostic. A turn appends one user message and one or more assistant
//! messages to the session, and returns the presentation events in order.

use tracing::{error, info, warn};

use crm_intent::Classifier;
use crm_query::QueryExecutor;
use crm_types::{AssistantError, ChatMessage, ClassificationResult, Intent, TabularResult};

use crate::events::PresentationEvent;
use crate::export::to_csv;
use crate::presentation::select_chart;
use crate::session::Session;

/// Reply for input no rule or model could place.
pub const HELP_MESSAGE: &str = "I couldn't understand your request. Please try one of these queries:\n\
- Show me top accounts\n\
- Show recent opportunities\n\
- Show opportunities by stage\n\
- List contacts\n\
- Create a chart of opportunity stages\n\
- Or write a custom SOQL query";

/// Reply for a successful query with zero rows.
pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

/// Placeholder explanation that is not worth repeating to the user.
const GENERIC_EXPLANATION: &str = "Processing your request...";

/// Everything a single turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub classification: ClassificationResult,
    pub events: Vec<PresentationEvent>,
}

impl TurnOutcome {
    /// Assistant messages appended this turn.
    pub fn assistant_messages(&self) -> Vec<&ChatMessage> {
        self.events
            .iter()
            .filter_map(PresentationEvent::as_message)
            .filter(|m| m.role == crm_types::Role::Assistant)
            .collect()
    }

    /// The rendered result, if the query returned rows.
    pub fn table(&self) -> Option<&TabularResult> {
        self.events.iter().find_map(|event| match event {
            PresentationEvent::RenderChart { table, .. } | PresentationEvent::RenderTable { table, .. } => {
                Some(table)
            }
            _ => None,
        })
    }

    /// `(file_name, csv)` of the offered download.
    pub fn download(&self) -> Option<(&str, &str)> {
        self.events.iter().find_map(|event| match event {
            PresentationEvent::Download { file_name, csv } => Some((file_name.as_str(), csv.as_str())),
            _ => None,
        })
    }
}

/// Classifier plus executor.
pub struct QueryPipeline {
    classifier: Classifier,
    executor: QueryExecutor,
}

impl QueryPipeline {
    pub fn new(classifier: Classifier, executor: QueryExecutor) -> Self {
        Self {
            classifier,
            executor,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn set_classifier(&mut self, classifier: Classifier) {
        self.classifier = classifier;
    }

    /// Run one user submission to completion.
    ///
    /// Fails only if the session is not authenticated or the text is empty.
    /// Query failures become an assistant message and an `Ok` outcome.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<TurnOutcome, AssistantError> {
        if text.trim().is_empty() {
            return Err(AssistantError::InvalidInput("message is empty".to_string()));
        }
        let crm = session
            .crm_session()
            .cloned()
            .ok_or(AssistantError::NotAuthenticated)?;

        let mut events = vec![PresentationEvent::Message(
            session.append(ChatMessage::user(text)),
        )];

        let classification = self.classifier.classify(text).await;
        info!(
            session_id = %session.id(),
            intent = %classification.intent,
            tier = %self.classifier.describe(),
            "Classified input"
        );

        let query = match &classification.query {
            Some(query) if classification.is_actionable() => query.clone(),
            _ => {
                events.push(reply(session, HELP_MESSAGE));
                return Ok(TurnOutcome {
                    classification,
                    events,
                });
            }
        };

        let intent = classification.intent;
        let result = match self.executor.execute(&crm, &query).await {
            Ok(result) => result,
            Err(e) => {
                warn!(session_id = %session.id(), intent = %intent, error = %e, "Turn aborted");
                events.push(reply(session, format!("Query failed: {}", e)));
                return Ok(TurnOutcome {
                    classification,
                    events,
                });
            }
        };

        if result.is_empty() {
            events.push(reply(session, NO_RESULTS_MESSAGE));
            return Ok(TurnOutcome {
                classification,
                events,
            });
        }

        events.push(reply(
            session,
            response_text(intent, &classification.explanation),
        ));

        let csv = match to_csv(&result) {
            Ok(csv) => Some(csv),
            Err(e) => {
                error!(error = %e, "Failed to build CSV download");
                None
            }
        };

        let title = intent.title().to_string();
        events.push(match select_chart(&result, intent) {
            Some(chart) => PresentationEvent::RenderChart {
                title,
                chart,
                table: result,
            },
            None => PresentationEvent::RenderTable {
                title,
                table: result,
            },
        });

        if let Some(csv) = csv {
            events.push(PresentationEvent::Download {
                file_name: intent.file_name().to_string(),
                csv,
            });
        }

        Ok(TurnOutcome {
            classification,
            events,
        })
    }
}

fn reply(session: &mut Session, content: impl Into<String>) -> PresentationEvent {
    PresentationEvent::Message(session.append(ChatMessage::assistant(content)))
}

/// Per-intent response text, prefixed by the classifier's explanation.
pub fn response_text(intent: Intent, explanation: &str) -> String {
    let explanation = explanation.trim();
    if explanation.is_empty() || explanation == GENERIC_EXPLANATION {
        intent.response_text().to_string()
    } else {
        format!("{}\n\n{}", explanation, intent.response_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crm_query::{CrmSession, MockCrmService, QueryError};
    use crm_types::Role;
    use serde_json::json;

    fn authenticated() -> Session {
        let mut session = Session::new();
        session.complete_login(CrmSession::new("https://acme.my.salesforce.com", "tok"));
        session.clear_history();
        session
    }

    fn pipeline(service: Arc<MockCrmService>) -> QueryPipeline {
        QueryPipeline::new(Classifier::rule_based(), QueryExecutor::new(service))
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let pipeline = pipeline(Arc::new(MockCrmService::new()));
        let mut session = Session::new();
        let err = pipeline.run_turn(&mut session, "List contacts").await.unwrap_err();
        assert!(matches!(err, AssistantError::NotAuthenticated));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_gets_help() {
        let service = Arc::new(MockCrmService::new());
        let pipeline = pipeline(service.clone());
        let mut session = authenticated();

        let outcome = pipeline.run_turn(&mut session, "what's the weather").await.unwrap();
        assert_eq!(outcome.classification.intent, Intent::Unknown);
        assert_eq!(outcome.assistant_messages()[0].content, HELP_MESSAGE);
        assert!(service.queries().is_empty());
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_successful_turn_renders_and_offers_download() {
        let service = Arc::new(MockCrmService::new().with_records(vec![
            json!({"attributes": {"type": "Contact"}, "Id": "003A", "Name": "Ada", "Email": "ada@acme.test"}),
        ]));
        let pipeline = pipeline(service.clone());
        let mut session = authenticated();

        let outcome = pipeline.run_turn(&mut session, "List contacts").await.unwrap();
        assert_eq!(outcome.classification.intent, Intent::Contacts);

        let messages = outcome.assistant_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.ends_with("Here are the recent contacts:"));

        assert!(matches!(outcome.events[2], PresentationEvent::RenderTable { .. }));
        let (file_name, csv) = outcome.download().unwrap();
        assert_eq!(file_name, "contacts.csv");
        assert!(csv.starts_with("Id,Name,Email\n"));

        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_query_error_is_one_message() {
        let service = Arc::new(
            MockCrmService::new().with_error(QueryError::MalformedQuery("unexpected token".into())),
        );
        let pipeline = pipeline(service);
        let mut session = authenticated();

        let outcome = pipeline
            .run_turn(&mut session, "SELECT Id FROM Account WHERE")
            .await
            .unwrap();
        assert_eq!(outcome.classification.intent, Intent::CustomQuery);
        let messages = outcome.assistant_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].content,
            "Query failed: Malformed query: unexpected token"
        );
        assert!(outcome.table().is_none());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_custom_query_runs_untrimmed() {
        let service = Arc::new(MockCrmService::new().with_records(vec![json!({"Id": "001A"})]));
        let pipeline = pipeline(service.clone());
        let mut session = authenticated();
        let soql = "  SELECT Id FROM Account LIMIT 1\n";

        let outcome = pipeline.run_turn(&mut session, soql).await.unwrap();
        assert_eq!(outcome.classification.intent, Intent::CustomQuery);
        assert_eq!(service.queries(), vec![soql.to_string()]);
        assert_eq!(session.messages()[0].content, soql);
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let pipeline = pipeline(Arc::new(MockCrmService::new()));
        let mut session = authenticated();
        let err = pipeline.run_turn(&mut session, " \t\n").await.unwrap_err();
        assert!(matches!(err, AssistantError::InvalidInput(_)));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_message() {
        let pipeline = pipeline(Arc::new(MockCrmService::new()));
        let mut session = authenticated();
        let outcome = pipeline.run_turn(&mut session, "Show recent opportunities").await.unwrap();
        assert_eq!(outcome.assistant_messages()[0].content, NO_RESULTS_MESSAGE);
        assert!(outcome.download().is_none());
    }

    #[tokio::test]
    async fn test_chart_intent_renders_chart() {
        let service = Arc::new(MockCrmService::new().with_records(vec![
            json!({"StageName": "Closed Won", "opportunityCount": 3, "totalAmount": 9000}),
            json!({"StageName": "Prospecting", "opportunityCount": 5, "totalAmount": 2000}),
        ]));
        let pipeline = pipeline(service);
        let mut session = authenticated();

        let outcome = pipeline
            .run_turn(&mut session, "Show a chart by stage")
            .await
            .unwrap();
        assert_eq!(outcome.classification.intent, Intent::OpportunityStageChart);
        match &outcome.events[2] {
            PresentationEvent::RenderChart { chart, .. } => {
                assert_eq!(chart.bars[0].label, "Closed Won")
            }
            other => panic!("expected chart, got {other:?}"),
        }
        assert_eq!(outcome.download().unwrap().0, "opportunities_by_stage.csv");
    }

    #[test]
    fn test_response_text_prefix() {
        assert_eq!(
            response_text(Intent::Contacts, "Listing contacts"),
            "Listing contacts\n\nHere are the recent contacts:"
        );
        assert_eq!(
            response_text(Intent::Contacts, "Processing your request..."),
            "Here are the recent contacts:"
        );
        assert_eq!(response_text(Intent::Contacts, ""), "Here are the recent contacts:");
    }
}
