//! Query execution: run a statement, flatten the records.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crm_types::TabularResult;

use crate::client::CrmDataService;
use crate::error::QueryError;
use crate::flatten::flatten_records;
use crate::session::CrmSession;

/// Runs queries against a CRM data service.
#[derive(Clone)]
pub struct QueryExecutor {
    service: Arc<dyn CrmDataService>,
}

impl QueryExecutor {
    pub fn new(service: Arc<dyn CrmDataService>) -> Self {
        Self { service }
    }

    /// Execute `query` verbatim and return the flattened result.
    ///
    /// Row order is the CRM's order. Zero rows is a successful empty result.
    pub async fn execute(
        &self,
        session: &CrmSession,
        query: &str,
    ) -> Result<TabularResult, QueryError> {
        let start = Instant::now();
        let records = match self.service.query(session, query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Query failed");
                return Err(e);
            }
        };

        let result = flatten_records(&records);
        debug!(
            rows = result.len(),
            columns = result.columns().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCrmService;
    use serde_json::json;

    #[tokio::test]
    async fn test_execute_flattens_records() {
        let service = Arc::new(MockCrmService::new().with_records(vec![
            json!({"attributes": {"type": "Contact"}, "Name": "Ada", "Account": {"Name": "Acme"}}),
            json!({"attributes": {"type": "Contact"}, "Name": "Bob", "Account": null}),
        ]));
        let executor = QueryExecutor::new(service.clone());
        let session = CrmSession::new("https://x", "t");

        let result = executor
            .execute(&session, "SELECT Name, Account.Name FROM Contact")
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.columns(), &["Name", "Account.Name", "Account"]);
        assert_eq!(service.queries(), vec!["SELECT Name, Account.Name FROM Contact"]);
    }

    #[tokio::test]
    async fn test_execute_empty_is_ok() {
        let executor = QueryExecutor::new(Arc::new(MockCrmService::new()));
        let session = CrmSession::new("https://x", "t");
        let result = executor.execute(&session, "SELECT Id FROM Account").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_execute_propagates_error() {
        let service = MockCrmService::new().with_error(QueryError::AuthExpired("expired".into()));
        let executor = QueryExecutor::new(Arc::new(service));
        let session = CrmSession::new("https://x", "t");
        let err = executor.execute(&session, "SELECT Id FROM Account").await.unwrap_err();
        assert_eq!(err, QueryError::AuthExpired("expired".into()));
    }
}
