//! # crm-types
//!
//! Shared domain types for the CRM assistant.
//!
//! This crate defines the core data structures passed between the
//! classification, query and presentation stages:
//! - Intent: the closed set of things a user can ask for
//! - ClassificationResult: intent + query + explanation
//! - TabularResult: flattened CRM records
//! - ChatMessage: one transcript entry
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use crm_types::Intent;
//!
//! assert_eq!(Intent::TopAccounts.file_name(), "top_accounts.csv");
//! ```

pub mod chat;
pub mod classification;
pub mod config;
pub mod error;
pub mod intent;
pub mod table;

pub use chat::{ChatMessage, Role};
pub use classification::ClassificationResult;
pub use config::{ClassifierSettings, SalesforceSettings, Settings};
pub use error::AssistantError;
pub use intent::Intent;
pub use table::{cell_to_f64, cell_to_string, Row, TabularResult};
