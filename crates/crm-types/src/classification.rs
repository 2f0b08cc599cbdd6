//! Output of either classification tier.

use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// Intent, query and a short human-readable explanation.
///
/// `query` is `None` exactly when `intent` is `Unknown`. For `CustomQuery`
/// it holds the user's text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The classified intent
    pub intent: Intent,

    /// Query to execute
    #[serde(default)]
    pub query: Option<String>,

    /// Why this intent was chosen
    #[serde(default)]
    pub explanation: String,
}

impl ClassificationResult {
    /// Create a result for a matched intent.
    pub fn matched(intent: Intent, query: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            intent,
            query: Some(query.into()),
            explanation: explanation.into(),
        }
    }

    /// Create the "no match" result.
    pub fn unknown(explanation: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unknown,
            query: None,
            explanation: explanation.into(),
        }
    }

    /// Returns true if there is something to execute.
    pub fn is_actionable(&self) -> bool {
        self.intent != Intent::Unknown && self.query.is_some()
    }
}
