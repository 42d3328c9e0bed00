//! Fake generation backend for testing.
//!
//! Returns a canned response or error and counts how often it was called,
//! so fallback behavior can be checked without network access.

use super::{AdapterError, GenerationRequest, RecipeBackend};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
enum FakeResponse {
    Candidate(Value),
    Error(AdapterError),
}

/// A fake recipe backend.
#[derive(Debug)]
pub struct FakeBackend {
    source: &'static str,
    model: Option<String>,
    configured: bool,
    response: FakeResponse,
    calls: AtomicUsize,
}

impl FakeBackend {
    /// A configured backend that returns `candidate` for every request.
    pub fn returning(source: &'static str, candidate: Value) -> Self {
        Self {
            source,
            model: None,
            configured: true,
            response: FakeResponse::Candidate(candidate),
            calls: AtomicUsize::new(0),
        }
    }

    /// A configured backend that fails every request with `error`.
    pub fn failing(source: &'static str, error: AdapterError) -> Self {
        Self {
            response: FakeResponse::Error(error),
            ..Self::returning(source, Value::Null)
        }
    }

    /// A backend that reports itself unconfigured.
    pub fn unconfigured(source: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::failing(
                source,
                AdapterError::NotConfigured {
                    backend: "fake",
                    message: "fake backend is unconfigured".to_string(),
                },
            )
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Number of times `generate` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeBackend for FakeBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn source(&self) -> &'static str {
        self.source
    }

    fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            FakeResponse::Candidate(value) => Ok(value.clone()),
            FakeResponse::Error(error) => Err(error.clone()),
        }
    }
}
