//! The two classification tiers as one tagged union.
//!
//! Resolved once per session: either a model was selected and the AI tier is
//! active, or everything goes through the rule-based classifier.

use crm_types::ClassificationResult;

use crate::classifier::RuleBasedClassifier;
use crate::resolver::AiResolver;

/// Active classification tier for a session.
#[derive(Debug, Clone)]
pub enum Classifier {
    /// Keyword rules only
    RuleBased(RuleBasedClassifier),
    /// Generative service with rule-based fallback
    AiAssisted(AiResolver),
}

impl Classifier {
    /// Rule-based tier with default term sets.
    pub fn rule_based() -> Self {
        Classifier::RuleBased(RuleBasedClassifier::new())
    }

    /// Returns true if the AI tier is active.
    pub fn is_ai_assisted(&self) -> bool {
        matches!(self, Classifier::AiAssisted(_))
    }

    /// Short label for logs and status output.
    pub fn describe(&self) -> String {
        match self {
            Classifier::RuleBased(_) => "rule-based".to_string(),
            Classifier::AiAssisted(resolver) => format!("ai-assisted ({})", resolver.model()),
        }
    }

    /// Classify `text` with the active tier. Never fails.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        match self {
            Classifier::RuleBased(rules) => rules.classify(text),
            Classifier::AiAssisted(resolver) => resolver.resolve(text).await,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::rule_based()
    }
}
