//! CRM data service trait and the Salesforce REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::QueryError;
use crate::session::CrmSession;

/// A raw CRM record.
pub type Record = Map<String, Value>;

/// External CRM data service: runs a query, returns records in order.
#[async_trait]
pub trait CrmDataService: Send + Sync {
    /// Execute `soql` verbatim and return every matching record.
    async fn query(&self, session: &CrmSession, soql: &str) -> Result<Vec<Record>, QueryError>;
}

/// Salesforce REST API client.
pub struct SalesforceClient {
    client: Client,
    api_version: String,
}

impl SalesforceClient {
    /// Create a client for the given REST API version (e.g. "v60.0").
    pub fn new(api_version: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_version: api_version.into(),
        })
    }

    async fn fetch(&self, session: &CrmSession, request: reqwest::RequestBuilder) -> Result<QueryPage, QueryError> {
        let response = request
            .bearer_auth(session.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default = "default_done")]
    done: bool,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(rename = "nextRecordsUrl", default)]
    next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "errorCode", default)]
    error_code: String,
}

const MALFORMED_CODES: &[&str] = &[
    "MALFORMED_QUERY",
    "INVALID_FIELD",
    "INVALID_TYPE",
    "INVALID_QUERY_FILTER_OPERATOR",
];

/// Map a non-success response to a `QueryError`.
fn classify_error(status: StatusCode, body: &str) -> QueryError {
    let first = serde_json::from_str::<Vec<ApiErrorBody>>(body)
        .ok()
        .and_then(|errors| errors.into_iter().next());

    let (code, message) = match first {
        Some(e) => (e.error_code, e.message),
        None => (String::new(), body.to_string()),
    };

    if status == StatusCode::UNAUTHORIZED || code == "INVALID_SESSION_ID" {
        return QueryError::AuthExpired(message);
    }
    if MALFORMED_CODES.contains(&code.as_str()) {
        return QueryError::MalformedQuery(message);
    }
    QueryError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CrmDataService for SalesforceClient {
    async fn query(&self, session: &CrmSession, soql: &str) -> Result<Vec<Record>, QueryError> {
        let url = format!(
            "{}/services/data/{}/query",
            session.instance_url, self.api_version
        );
        let mut page = self
            .fetch(session, self.client.get(&url).query(&[("q", soql)]))
            .await?;
        let mut records = std::mem::take(&mut page.records);

        // Follow paging until the server reports done.
        while !page.done {
            let Some(next) = page.next_records_url.take() else {
                break;
            };
            debug!(next = %next, fetched = records.len(), "Fetching next page");
            let url = format!("{}{}", session.instance_url, next);
            page = self.fetch(session, self.client.get(&url)).await?;
            records.append(&mut page.records);
        }

        Ok(records)
    }
}
