//! Recipe generation backends and the fallback orchestrator.
//!
//! Two backends produce raw candidate JSON for a request: a workflow webhook
//! and the generative language API. [`RecipeGenerator`] tries them in order
//! and runs whatever comes back through [`crate::recipe::normalize`].

mod fake;
mod gemini;
mod orchestrator;
pub mod prompts;
#[cfg(test)]
mod test_server;
mod webhook;

pub use fake::FakeBackend;
pub use gemini::{extract_json, GeminiBackend, GEMINI_SOURCE};
pub use orchestrator::{
    Attempt, AttemptFailure, GenerationError, GenerationState, RecipeGenerator, ANONYMOUS_USER_ID,
};
pub use webhook::{WebhookBackend, WebhookProbe, PAYLOAD_SOURCE, WEBHOOK_SOURCE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::identity::Identity;

/// What the user gave us to cook from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// A list of ingredients to build a dish around.
    Ingredients,
    /// The name of a dish.
    Dish,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Ingredients => "ingredients",
            GenerationKind::Dish => "dish",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub input: String,
    pub identity: Option<Identity>,
}

impl GenerationRequest {
    /// Validate the raw `type` and `input` fields of an incoming request.
    pub fn new(
        kind: Option<&str>,
        input: Option<&str>,
        identity: Option<Identity>,
    ) -> Result<Self, GenerationError> {
        let kind = kind.map(str::trim).filter(|k| !k.is_empty());
        let input = input.map(str::trim).filter(|i| !i.is_empty());

        let (Some(kind), Some(input)) = (kind, input) else {
            return Err(GenerationError::Validation(
                "Missing required fields: type and input".to_string(),
            ));
        };

        let kind = match kind {
            "ingredients" => GenerationKind::Ingredients,
            "dish" => GenerationKind::Dish,
            other => {
                return Err(GenerationError::Validation(format!(
                    "Unknown generation type {other:?}; expected \"ingredients\" or \"dish\""
                )))
            }
        };

        Ok(Self {
            kind,
            input: input.to_string(),
            identity,
        })
    }

    pub fn user_id(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.id.as_str())
            .unwrap_or(ANONYMOUS_USER_ID)
    }
}

/// Failure of a single generation backend.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("{backend} is not configured: {message}")]
    NotConfigured {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} request timed out after {timeout_secs}s")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    #[error("{backend} request failed: {message}")]
    RequestFailed {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} returned error: {status} - {message}")]
    ApiError {
        backend: &'static str,
        status: u16,
        message: String,
    },

    #[error("{backend} response could not be parsed: {message}")]
    ParseError {
        backend: &'static str,
        message: String,
    },
}

impl AdapterError {
    pub fn backend(&self) -> &'static str {
        match self {
            AdapterError::NotConfigured { backend, .. }
            | AdapterError::Timeout { backend, .. }
            | AdapterError::RequestFailed { backend, .. }
            | AdapterError::ApiError { backend, .. }
            | AdapterError::ParseError { backend, .. } => *backend,
        }
    }

    /// HTTP status of the backend response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(
        backend: &'static str,
        timeout: std::time::Duration,
        error: reqwest::Error,
    ) -> Self {
        if error.is_timeout() {
            AdapterError::Timeout {
                backend,
                timeout_secs: timeout.as_secs(),
            }
        } else {
            AdapterError::RequestFailed {
                backend,
                message: error.to_string(),
            }
        }
    }
}

/// Trait for recipe generation backends.
///
/// A backend returns the raw JSON it got back; shape checks belong to the
/// normalizer, not to the backend.
#[async_trait]
pub trait RecipeBackend: Send + Sync {
    /// Whether the backend has what it needs to be attempted at all.
    fn is_configured(&self) -> bool;

    /// Provenance tag stamped on recipes produced by this backend.
    fn source(&self) -> &'static str;

    /// Model identifier, if the backend exposes one.
    fn model_name(&self) -> Option<&str>;

    /// Produce a raw recipe candidate for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_type_and_input() {
        assert!(matches!(
            GenerationRequest::new(None, Some("eggs"), None),
            Err(GenerationError::Validation(_))
        ));
        assert!(matches!(
            GenerationRequest::new(Some("dish"), Some("   "), None),
            Err(GenerationError::Validation(_))
        ));
        assert!(matches!(
            GenerationRequest::new(Some("dessert"), Some("cake"), None),
            Err(GenerationError::Validation(_))
        ));
    }

    #[test]
    fn test_request_parses_kind_and_defaults_user() {
        let request =
            GenerationRequest::new(Some("ingredients"), Some(" tomato, garlic "), None).unwrap();
        assert_eq!(request.kind, GenerationKind::Ingredients);
        assert_eq!(request.input, "tomato, garlic");
        assert_eq!(request.user_id(), ANONYMOUS_USER_ID);

        let request = GenerationRequest::new(
            Some("dish"),
            Some("paella"),
            Some(Identity::new("u-1", None)),
        )
        .unwrap();
        assert_eq!(request.kind, GenerationKind::Dish);
        assert_eq!(request.user_id(), "u-1");
    }
}
