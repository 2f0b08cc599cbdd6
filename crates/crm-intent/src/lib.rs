//! # crm-intent
//!
//! Turns free text into an intent and a SOQL query.
//!
//! ## Core Concepts
//!
//! - **Query templates**: one static SOQL string per named intent
//! - **Rule-based classifier**: ordered keyword rules, no external calls
//! - **AI-assisted resolver**: prompts a generative service for a JSON
//!   `{intent, query, explanation}` reply, falling back to the rules on any failure
//! - **Model selection**: probes an ordered list of models once per session
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crm_intent::{Classifier, ModelSelector, AiResolver};
//!
//! let classifier = match ModelSelector::new(models).select(service).await {
//!     Some(handle) => Classifier::AiAssisted(AiResolver::new(handle)),
//!     None => Classifier::rule_based(),
//! };
//! let result = classifier.classify("Show me top accounts").await;
//! ```

pub mod classifier;
pub mod resolver;
pub mod selection;
pub mod service;
pub mod templates;
pub mod tier;

pub use classifier::{looks_like_soql, ClassifierConfig, RuleBasedClassifier};
pub use resolver::{
    build_prompt, extract_json, parse_reply, AiResolver, ClassificationFailure, ClassifierHandle,
    SCHEMA_CONTEXT,
};
pub use selection::ModelSelector;
pub use service::{
    GeminiService, GeminiServiceConfig, GenerativeService, MockGenerativeService, ServiceError,
};
pub use templates::{all_templates, template};
pub use tier::Classifier;
