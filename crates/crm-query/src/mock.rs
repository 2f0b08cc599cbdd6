//! Scripted CRM doubles for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::Authenticator;
use crate::client::{CrmDataService, Record};
use crate::error::{AuthError, QueryError};
use crate::session::{CrmSession, Credentials};

/// CRM service that replays scripted responses in order and records every
/// query it receives. With the script exhausted it returns no records.
#[derive(Default)]
pub struct MockCrmService {
    responses: Mutex<VecDeque<Result<Vec<Record>, QueryError>>>,
    queries: Mutex<Vec<String>>,
}

impl MockCrmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response. Non-object values are skipped.
    pub fn with_records(self, records: Vec<Value>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.push(Ok(records));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: QueryError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, response: Result<Vec<Record>, QueryError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CrmDataService for MockCrmService {
    async fn query(&self, _session: &CrmSession, soql: &str) -> Result<Vec<Record>, QueryError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(soql.to_string());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Authenticator that accepts one password and issues a fixed token.
pub struct MockAuthenticator {
    password: String,
    instance_url: String,
}

impl MockAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            instance_url: "https://mock.my.salesforce.com".to_string(),
        }
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<CrmSession, AuthError> {
        use secrecy::ExposeSecret;

        if credentials.password.expose_secret() == self.password {
            Ok(CrmSession::new(self.instance_url.clone(), "mock-token"))
        } else {
            Err(AuthError::InvalidLogin(
                "invalid_grant: authentication failure".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let service = MockCrmService::new()
            .with_records(vec![json!({"Id": "1"})])
            .with_error(QueryError::MalformedQuery("bad".into()));
        let session = CrmSession::new("https://x", "t");

        assert_eq!(service.query(&session, "q1").await.unwrap().len(), 1);
        assert!(service.query(&session, "q2").await.is_err());
        assert!(service.query(&session, "q3").await.unwrap().is_empty());
        assert_eq!(service.queries(), vec!["q1", "q2", "q3"]);
    }
}
