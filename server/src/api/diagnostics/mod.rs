//! Connectivity checks for the external services.
//!
//! Every check answers 200. Whether the service is usable is reported in the
//! `connected` field, along with a message, error or warning.

pub mod database;
pub mod gemini;
pub mod supabase;
pub mod webhook;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use souschef_core::StoreError;
use utoipa::{OpenApi, ToSchema};

/// Result of a connectivity check
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Reply to the generative API test prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_response: Option<String>,
    /// HTTP status returned by the webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// `configured` or `not configured`; the URL itself is never echoed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_signed_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticResponse {
    fn new(connected: bool) -> Self {
        Self {
            connected,
            message: None,
            error: None,
            warning: None,
            test_response: None,
            status: None,
            webhook_url: None,
            table_exists: None,
            recipe_count: None,
            user_signed_in: None,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(true)
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(false)
        }
    }

    pub fn missing_supabase_config() -> Self {
        Self::failure("Missing Supabase environment variables")
    }
}

/// The provider's own message for a store failure, falling back to ours.
fn provider_message(error: &StoreError) -> String {
    error
        .provider_error()
        .map(|p| p.message.clone())
        .unwrap_or_else(|| error.to_string())
}

/// Returns the router for the diagnostic endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/test-gemini", get(gemini::test_gemini))
        .route("/api/test-n8n", get(webhook::test_n8n))
        .route("/api/test-supabase", get(supabase::test_supabase))
        .route("/api/test-database", get(database::test_database))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        gemini::test_gemini,
        webhook::test_n8n,
        supabase::test_supabase,
        database::test_database,
    ),
    components(schemas(DiagnosticResponse))
)]
pub struct ApiDoc;
