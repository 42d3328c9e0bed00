//! Fallback orchestration across generation backends.
//!
//! The flow is a three-state machine:
//!
//! ```text
//! TryWebhook ──(ok)──────────────────────────────▶ Respond(recipe)
//!     │ (unconfigured / any failure)
//!     ▼
//! TryGenerativeAi ──(ok)─────────────────────────▶ Respond(recipe)
//!     │ (unconfigured)                 (failure)
//!     ▼                                    ▼
//! Respond(NoBackendAvailable)        Respond(Failed)
//! ```
//!
//! Each backend is attempted at most once per request, sequentially.

use super::{AdapterError, GenerationRequest, RecipeBackend};
use crate::recipe::{normalize, Provenance, Recipe, SchemaError};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// User id recorded on recipes generated without a signed-in user.
pub const ANONYMOUS_USER_ID: &str = "anonymous";

/// Terminal generation failure, as surfaced to callers.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(String),

    #[error("No recipe generation method available: {details}")]
    NoBackendAvailable { details: String },

    #[error("Failed to generate recipe: {details}")]
    Failed { details: String },
}

/// Why a single attempt produced no usable recipe.
#[derive(Debug)]
pub enum AttemptFailure {
    Adapter(AdapterError),
    Schema(SchemaError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Adapter(e) => write!(f, "{e}"),
            AttemptFailure::Schema(e) => write!(f, "Invalid recipe from backend: {e}"),
        }
    }
}

/// Outcome of running one backend through the normalizer.
pub type Attempt = Result<Recipe, AttemptFailure>;

/// States of the fallback machine.
#[derive(Debug)]
pub enum GenerationState {
    TryWebhook,
    TryGenerativeAi {
        /// Why the webhook produced nothing, if it was attempted.
        webhook_failure: Option<String>,
    },
    Respond(Result<Recipe, GenerationError>),
}

impl GenerationState {
    /// Transition out of `TryWebhook`. Every failure falls through.
    pub fn after_webhook(attempt: Option<Attempt>) -> Self {
        match attempt {
            Some(Ok(recipe)) => GenerationState::Respond(Ok(recipe)),
            Some(Err(failure)) => GenerationState::TryGenerativeAi {
                webhook_failure: Some(failure.to_string()),
            },
            None => GenerationState::TryGenerativeAi {
                webhook_failure: None,
            },
        }
    }

    /// Transition out of `TryGenerativeAi`. There is nothing left to fall
    /// back to, so every outcome is terminal.
    pub fn after_generative(attempt: Option<Attempt>, webhook_failure: Option<String>) -> Self {
        let outcome = match attempt {
            Some(Ok(recipe)) => Ok(recipe),
            None | Some(Err(AttemptFailure::Adapter(AdapterError::NotConfigured { .. }))) => {
                let mut details =
                    "Please configure N8N_WEBHOOK_URL or GOOGLE_GENAI_API_KEY.".to_string();
                if let Some(failure) = webhook_failure {
                    details.push_str(&format!(" Webhook attempt failed: {failure}"));
                }
                Err(GenerationError::NoBackendAvailable { details })
            }
            Some(Err(failure)) => Err(GenerationError::Failed {
                details: failure.to_string(),
            }),
        };
        GenerationState::Respond(outcome)
    }
}

/// Sequences the webhook and generative backends for each request.
#[derive(Clone)]
pub struct RecipeGenerator {
    webhook: Arc<dyn RecipeBackend>,
    generative: Arc<dyn RecipeBackend>,
}

impl RecipeGenerator {
    pub fn new(webhook: Arc<dyn RecipeBackend>, generative: Arc<dyn RecipeBackend>) -> Self {
        Self {
            webhook,
            generative,
        }
    }

    /// Whether at least one backend could be attempted.
    pub fn has_configured_backend(&self) -> bool {
        self.webhook.is_configured() || self.generative.is_configured()
    }

    /// Generate a normalized recipe, falling back from the webhook to the
    /// generative backend.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Recipe, GenerationError> {
        tracing::info!(kind = %request.kind, "Generating recipe");

        let mut state = GenerationState::TryWebhook;
        loop {
            state = match state {
                GenerationState::TryWebhook => {
                    let attempt = self.attempt(self.webhook.as_ref(), request).await;
                    if let Some(Err(failure)) = &attempt {
                        tracing::warn!(error = %failure, "Webhook generation failed, falling back");
                    }
                    GenerationState::after_webhook(attempt)
                }
                GenerationState::TryGenerativeAi { webhook_failure } => {
                    let attempt = self.attempt(self.generative.as_ref(), request).await;
                    GenerationState::after_generative(attempt, webhook_failure)
                }
                GenerationState::Respond(outcome) => {
                    match &outcome {
                        Ok(recipe) => tracing::info!(
                            source = recipe.provenance.source.as_deref().unwrap_or_default(),
                            "Recipe generated"
                        ),
                        Err(e) => tracing::error!(error = %e, "Recipe generation failed"),
                    }
                    return outcome;
                }
            };
        }
    }

    /// Run one backend and normalize its output. `None` when the backend is
    /// not configured and therefore was not called.
    async fn attempt(
        &self,
        backend: &dyn RecipeBackend,
        request: &GenerationRequest,
    ) -> Option<Attempt> {
        if !backend.is_configured() {
            tracing::debug!(source = backend.source(), "Backend not configured, skipping");
            return None;
        }

        let attempt = match backend.generate(request).await {
            Ok(candidate) => normalize(&candidate)
                .map(|mut recipe| {
                    recipe.provenance = Provenance {
                        generated_at: Some(Utc::now()),
                        source: Some(backend.source().to_string()),
                        model: backend.model_name().map(str::to_string),
                        user_id: Some(request.user_id().to_string()),
                    };
                    recipe
                })
                .map_err(AttemptFailure::Schema),
            Err(e) => Err(AttemptFailure::Adapter(e)),
        };

        Some(attempt)
    }
}
