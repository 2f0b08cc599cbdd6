//! Error types shared across the CRM assistant.

use thiserror::Error;

/// Unified error type for assistant-level operations.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A turn was submitted without a live CRM session
    #[error("Not authenticated with the CRM")]
    NotAuthenticated,

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
