//! Generative classifier service trait and implementations.
//!
//! The core only needs three things from the service: list the models it
//! offers, generate text for a prompt with a given model, and (derived from
//! generation) probe whether a model works.

mod gemini;
mod mock;

pub use gemini::{GeminiService, GeminiServiceConfig};
pub use mock::MockGenerativeService;

use async_trait::async_trait;
use thiserror::Error;

/// Prompt used to probe a model.
pub const PROBE_PROMPT: &str = "Hello";

/// Error type for generative service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Model not available: {0}")]
    NoModel(String),
}

/// External generative text service.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Model identifiers offered by the service, in service order.
    async fn list_models(&self) -> Result<Vec<String>, ServiceError>;

    /// Generate free text for `prompt` using `model`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError>;

    /// Check that `model` can serve a trivial generation request.
    async fn probe(&self, model: &str) -> Result<(), ServiceError> {
        self.generate(model, PROBE_PROMPT).await.map(|_| ())
    }
}
