//! Model selection at session start.
//!
//! Candidates are probed in order with a trivial generation request; the
//! first one that answers becomes the session's classifier. Listed models
//! whose name mentions "gemini" are tried ahead of the fixed preference list,
//! the most recently listed first.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::resolver::ClassifierHandle;
use crate::service::GenerativeService;

/// Probes candidate models and picks the first that works.
pub struct ModelSelector {
    preferences: Vec<String>,
    prefer_listed: bool,
}

impl ModelSelector {
    /// Create a selector over an ordered preference list.
    pub fn new(preferences: Vec<String>) -> Self {
        Self {
            preferences,
            prefer_listed: true,
        }
    }

    /// Whether listed "gemini" models are tried first.
    pub fn with_prefer_listed(mut self, prefer_listed: bool) -> Self {
        self.prefer_listed = prefer_listed;
        self
    }

    /// Candidate order for the given listing. Each qualifying listed model
    /// is pushed to the front, so the last one listed is probed first.
    pub fn candidates(&self, listed: &[String]) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        if self.prefer_listed {
            for model in listed.iter().rev() {
                if model.to_lowercase().contains("gemini")
                    && !self.preferences.contains(model)
                    && !candidates.contains(model)
                {
                    candidates.push(model.clone());
                }
            }
        }

        for model in &self.preferences {
            if !candidates.contains(model) {
                candidates.push(model.clone());
            }
        }

        candidates
    }

    /// Probe candidates in order. `None` if every candidate fails.
    pub async fn select(&self, service: Arc<dyn GenerativeService>) -> Option<ClassifierHandle> {
        let listed = if self.prefer_listed {
            match service.list_models().await {
                Ok(models) => {
                    info!(count = models.len(), "Listed available models");
                    models
                }
                Err(e) => {
                    warn!(error = %e, "Could not list models");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        for model in self.candidates(&listed) {
            debug!(model = %model, "Probing model");
            match service.probe(&model).await {
                Ok(()) => {
                    info!(model = %model, "Selected classifier model");
                    return Some(ClassifierHandle::new(service, model));
                }
                Err(e) => warn!(model = %model, error = %e, "Model probe failed"),
            }
        }

        warn!("No classifier model available");
        None
    }
}
