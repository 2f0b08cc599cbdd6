//! Mock generative service for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerativeService, ServiceError, PROBE_PROMPT};

/// Scripted generative service.
///
/// Models in `working` answer probes; every other model fails. Generation
/// for a real prompt returns the scripted reply, or fails if none is set.
#[derive(Default)]
pub struct MockGenerativeService {
    listed: Vec<String>,
    working: HashSet<String>,
    reply: Mutex<Option<String>>,
    list_fails: bool,
    probes: Mutex<Vec<String>>,
    generations: AtomicUsize,
}

impl MockGenerativeService {
    /// A service where every call fails.
    pub fn unavailable() -> Self {
        Self {
            list_fails: true,
            ..Default::default()
        }
    }

    /// A service where `model` works and replies with `reply`.
    pub fn replying(model: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::default()
            .with_working_model(model)
            .with_reply(reply)
    }

    /// Mark a model as answering probes.
    pub fn with_working_model(mut self, model: impl Into<String>) -> Self {
        self.working.insert(model.into());
        self
    }

    /// Add a model to the `list_models` output.
    pub fn with_listed_model(mut self, model: impl Into<String>) -> Self {
        self.listed.push(model.into());
        self
    }

    /// Set the reply for classification prompts.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.set_reply(Some(reply.into()));
        self
    }

    /// Replace the reply mid-test.
    pub fn set_reply(&self, reply: Option<String>) {
        if let Ok(mut slot) = self.reply.lock() {
            *slot = reply;
        }
    }

    /// Models probed so far, in order.
    pub fn probed_models(&self) -> Vec<String> {
        self.probes.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of non-probe generation calls.
    pub fn generation_count(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeService for MockGenerativeService {
    async fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        if self.list_fails {
            return Err(ServiceError::Api("listing disabled".to_string()));
        }
        Ok(self.listed.clone())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ServiceError> {
        if prompt == PROBE_PROMPT {
            if let Ok(mut probes) = self.probes.lock() {
                probes.push(model.to_string());
            }
        } else {
            self.generations.fetch_add(1, Ordering::SeqCst);
        }

        if !self.working.contains(model) {
            return Err(ServiceError::NoModel(model.to_string()));
        }

        if prompt == PROBE_PROMPT {
            return Ok("Hello!".to_string());
        }

        self.reply
            .lock()
            .ok()
            .and_then(|r| r.clone())
            .ok_or_else(|| ServiceError::Api("no scripted reply".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_only_working_models() {
        let service = MockGenerativeService::default().with_working_model("good");
        assert!(service.probe("good").await.is_ok());
        assert!(service.probe("bad").await.is_err());
        assert_eq!(service.probed_models(), vec!["good", "bad"]);
        assert_eq!(service.generation_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_reply() {
        let service = MockGenerativeService::replying("m", "{}");
        assert_eq!(service.generate("m", "classify this").await.unwrap(), "{}");
        service.set_reply(None);
        assert!(service.generate("m", "classify this").await.is_err());
        assert_eq!(service.generation_count(), 2);
    }
}
