//! Rule-based intent classification.
//!
//! This module implements the `RuleBasedClassifier`, a deterministic keyword
//! matcher that needs no external service. It is the fallback for the
//! AI-assisted tier and the only tier when no model is available.
//!
//! Matching is substring based over the lowercased input. Rules are tried in
//! a fixed order and the first match wins:
//!
//! 1. account + superlative -> `top_accounts`
//! 2. opportunity + recency -> `recent_opportunities`
//! 3. opportunity + stage -> `opportunity_by_stage`
//! 4. contact -> `contacts`
//! 5. chart or "show me": stage -> `opportunity_stage_chart`, opportunity -> `opportunity_amount_chart`
//! 6. catch-alls over "top"/"all"/bare opportunity/bare account
//!
//! A literal SOQL statement bypasses all of the above.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crm_types::{ClassificationResult, Intent};

use crate::templates::template;

/// Term sets for each concept the rules look for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub account_terms: Vec<String>,
    pub opportunity_terms: Vec<String>,
    pub recency_terms: Vec<String>,
    pub stage_terms: Vec<String>,
    pub contact_terms: Vec<String>,
    pub chart_terms: Vec<String>,
    /// Words that make an account question a ranking question
    pub superlative_terms: Vec<String>,
}

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            account_terms: terms(&[
                "account",
                "accounts",
                "customer",
                "customers",
                "client",
                "clients",
                "top account",
                "best account",
                "highest value account",
            ]),
            opportunity_terms: terms(&[
                "opportunity",
                "opportunities",
                "deal",
                "deals",
                "sale",
                "sales",
            ]),
            recency_terms: terms(&["recent", "latest", "new", "newest", "last"]),
            stage_terms: terms(&["stage", "status", "phase", "pipeline", "progress"]),
            contact_terms: terms(&[
                "contact",
                "contacts",
                "people",
                "person",
                "employee",
                "employees",
            ]),
            chart_terms: terms(&[
                "chart",
                "graph",
                "visual",
                "visualization",
                "diagram",
                "plot",
            ]),
            superlative_terms: terms(&["top", "best", "highest", "largest"]),
        }
    }
}

/// Returns true if `text` is itself a SOQL statement: it starts with
/// "select" and contains " from ", case-insensitively.
pub fn looks_like_soql(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with("select") && lower.contains(" from ")
}

/// Deterministic keyword classifier.
#[derive(Debug, Clone)]
pub struct RuleBasedClassifier {
    config: ClassifierConfig,
}

impl RuleBasedClassifier {
    /// Create a classifier with the default term sets.
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    /// Create a classifier with custom term sets.
    pub fn with_config(mut config: ClassifierConfig) -> Self {
        for set in [
            &mut config.account_terms,
            &mut config.opportunity_terms,
            &mut config.recency_terms,
            &mut config.stage_terms,
            &mut config.contact_terms,
            &mut config.chart_terms,
            &mut config.superlative_terms,
        ] {
            for term in set.iter_mut() {
                *term = term.to_lowercase();
            }
        }
        Self { config }
    }

    /// Classify free text. Total: every input yields exactly one intent.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if looks_like_soql(text) {
            debug!("Input is a literal SOQL statement");
            return ClassificationResult::matched(
                Intent::CustomQuery,
                text,
                "Running your custom SOQL query",
            );
        }

        let lower = text.to_lowercase();
        let result = match self.match_rules(&lower) {
            Some((intent, explanation)) => match template(intent) {
                Some(query) => ClassificationResult::matched(intent, query, explanation),
                None => ClassificationResult::unknown(explanation),
            },
            None => ClassificationResult::unknown("Using rule-based fallback processing"),
        };

        debug!(intent = %result.intent, "Rule-based classification");
        result
    }

    fn match_rules(&self, lower: &str) -> Option<(Intent, &'static str)> {
        let c = &self.config;
        let account = contains_any(lower, &c.account_terms);
        let opportunity = contains_any(lower, &c.opportunity_terms);
        let recency = contains_any(lower, &c.recency_terms);
        let stage = contains_any(lower, &c.stage_terms);

        if account && contains_any(lower, &c.superlative_terms) {
            return Some((
                Intent::TopAccounts,
                "Finding the top accounts by opportunity amount",
            ));
        }

        if opportunity && recency {
            return Some((
                Intent::RecentOpportunities,
                "Listing the most recently created opportunities",
            ));
        }

        if opportunity && stage {
            return Some((
                Intent::OpportunityByStage,
                "Showing opportunities grouped by stage",
            ));
        }

        if contains_any(lower, &c.contact_terms) {
            return Some((Intent::Contacts, "Listing contact information"));
        }

        // Entering the chart branch ends matching even if neither sub-rule fires.
        if contains_any(lower, &c.chart_terms) || lower.contains("show me") {
            if stage {
                return Some((
                    Intent::OpportunityStageChart,
                    "Creating a chart of opportunities by stage",
                ));
            }
            if opportunity {
                return Some((
                    Intent::OpportunityAmountChart,
                    "Creating a chart of opportunities by amount",
                ));
            }
            return None;
        }

        if opportunity && lower.contains("top") {
            return Some((
                Intent::OpportunityAmountChart,
                "Showing top opportunities by amount",
            ));
        }
        if opportunity && lower.contains("all") {
            return Some((Intent::RecentOpportunities, "Listing opportunities"));
        }
        if opportunity {
            return Some((Intent::RecentOpportunities, "Showing recent opportunities"));
        }
        if account {
            return Some((Intent::TopAccounts, "Showing top accounts"));
        }

        None
    }
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| text.contains(t.as_str()))
}
