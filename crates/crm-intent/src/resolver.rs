//! AI-assisted intent resolution.
//!
//! The resolver sends one prompt (schema context + user text + reply format)
//! to the generative service and trusts a well-formed JSON reply as-is. Any
//! failure along the way returns the rule-based result for the same text,
//! unblended with partial AI output.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crm_types::{ClassificationResult, Intent};

use crate::classifier::RuleBasedClassifier;
use crate::service::{GenerativeService, ServiceError};
use crate::templates::template;

/// Default description of the CRM schema given to the model.
pub const SCHEMA_CONTEXT: &str = r#"You are an AI assistant specialized in Salesforce data analysis. Your task is to interpret natural language queries and convert them to SOQL (Salesforce Object Query Language) queries.

Common Salesforce objects and their fields:
- Account: Id, Name, Industry, AnnualRevenue
- Opportunity: Id, Name, Amount, StageName, CloseDate, AccountId, Account.Name, CreatedDate, IsClosed
- Contact: Id, Name, Email, Phone, AccountId, Account.Name, CreatedDate

Custom Objects (note the __c suffix):
- College__c: Id, Name, city__c
- Student__c: Id, First_Name__c, Last_Name__c

Important rules for custom objects:
1. Always use the __c suffix for custom object names
2. Custom fields also use the __c suffix
3. When querying custom objects, use the exact object name with __c

Common query intents:
- top_accounts: Queries for accounts with highest opportunity amounts
- recent_opportunities: Lists the most recently created opportunities
- opportunity_by_stage: Groups opportunities by their stage
- contacts: Lists contact information
- opportunity_stage_chart: Similar to opportunity_by_stage but meant for visualization
- opportunity_amount_chart: Shows opportunities with highest amounts
- custom_query: Any valid SOQL query provided by the user"#;

/// Why an AI reply could not be used. Always recovered by fallback.
#[derive(Debug, Error)]
pub enum ClassificationFailure {
    #[error("classifier service failed: {0}")]
    Service(#[from] ServiceError),

    #[error("reply contains no JSON object")]
    NoJson,

    #[error("reply JSON is invalid: {0}")]
    InvalidJson(String),

    #[error("reply JSON has no intent")]
    MissingIntent,

    #[error("reply names an unrecognized intent: {0}")]
    UnknownIntentTag(String),

    #[error("reply names custom_query without a query")]
    MissingQuery,
}

/// Build the full prompt for one classification request.
pub fn build_prompt(schema_context: &str, text: &str) -> String {
    let intents = Intent::ALL
        .iter()
        .map(|i| i.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{schema_context}\n\nUser query: {text}\n\n\
Please analyze this query about Salesforce data and respond with a JSON in this exact format:\n\
{{\"intent\": \"[one of: {intents}]\", \
\"query\": \"[the SOQL query to execute or null if unknown]\", \
\"explanation\": \"[brief explanation of what the query will do]\"}}"
    )
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse a reply into a classification result.
pub fn parse_reply(reply: &str) -> Result<ClassificationResult, ClassificationFailure> {
    let json = extract_json(reply).ok_or(ClassificationFailure::NoJson)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ClassificationFailure::InvalidJson(e.to_string()))?;

    let tag = value
        .get("intent")
        .and_then(Value::as_str)
        .ok_or(ClassificationFailure::MissingIntent)?;
    let intent: Intent = tag
        .parse()
        .map_err(|_| ClassificationFailure::UnknownIntentTag(tag.to_string()))?;

    let explanation = value
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if intent == Intent::Unknown {
        return Ok(ClassificationResult::unknown(explanation));
    }

    let query = value
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty() && *q != "null")
        .map(str::to_string)
        .or_else(|| template(intent).map(str::to_string))
        .ok_or(ClassificationFailure::MissingQuery)?;

    Ok(ClassificationResult::matched(intent, query, explanation))
}

/// Handle to a probed, working model.
#[derive(Clone)]
pub struct ClassifierHandle {
    service: Arc<dyn GenerativeService>,
    model: String,
}

impl ClassifierHandle {
    /// Wrap a service and the model selected for it.
    pub fn new(service: Arc<dyn GenerativeService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    /// The selected model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("model", &self.model)
            .finish()
    }
}

/// AI-assisted resolver with rule-based fallback.
#[derive(Debug, Clone)]
pub struct AiResolver {
    handle: ClassifierHandle,
    schema_context: String,
    fallback: RuleBasedClassifier,
}

impl AiResolver {
    /// Create a resolver using the default schema context.
    pub fn new(handle: ClassifierHandle) -> Self {
        Self::with_schema_context(handle, SCHEMA_CONTEXT)
    }

    /// Create a resolver with a custom schema context.
    pub fn with_schema_context(handle: ClassifierHandle, schema_context: impl Into<String>) -> Self {
        Self {
            handle,
            schema_context: schema_context.into(),
            fallback: RuleBasedClassifier::new(),
        }
    }

    /// Model used for classification.
    pub fn model(&self) -> &str {
        self.handle.model()
    }

    /// Resolve `text`, falling back to rule-based classification on any failure.
    pub async fn resolve(&self, text: &str) -> ClassificationResult {
        match self.try_resolve(text).await {
            Ok(result) => {
                info!(intent = %result.intent, model = self.model(), "AI classification");
                result
            }
            Err(failure) => {
                warn!(error = %failure, "AI classification failed, using rule-based fallback");
                self.fallback.classify(text)
            }
        }
    }

    async fn try_resolve(&self, text: &str) -> Result<ClassificationResult, ClassificationFailure> {
        let prompt = build_prompt(&self.schema_context, text);
        debug!(prompt_len = prompt.len(), "Sending classification prompt");

        let reply = self.handle.service.generate(&self.handle.model, &prompt).await?;
        parse_reply(&reply)
    }
}
