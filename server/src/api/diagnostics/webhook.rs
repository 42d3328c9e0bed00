use super::DiagnosticResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use souschef_core::generation::{RecipeBackend, WebhookProbe};

const CONFIGURED: &str = "configured";
const NOT_CONFIGURED: &str = "not configured";

fn from_probe(probe: &WebhookProbe) -> DiagnosticResponse {
    let mut response = if probe.is_success() {
        DiagnosticResponse::success("n8n webhook responded")
    } else {
        DiagnosticResponse::failure(format!("HTTP {}", probe.status))
    };
    response.status = Some(probe.status);
    response.webhook_url = Some(CONFIGURED.to_string());
    response
}

/// Post a test payload to the workflow webhook.
#[utoipa::path(
    get,
    path = "/api/test-n8n",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Webhook connectivity", body = DiagnosticResponse)
    )
)]
pub async fn test_n8n(State(state): State<AppState>) -> Json<DiagnosticResponse> {
    if !state.webhook.is_configured() {
        return Json(DiagnosticResponse {
            webhook_url: Some(NOT_CONFIGURED.to_string()),
            ..DiagnosticResponse::failure("N8N_WEBHOOK_URL not configured")
        });
    }

    let response = match state.webhook.probe().await {
        Ok(probe) => {
            tracing::debug!(status = probe.status, body = %probe.body, "Webhook probe answered");
            from_probe(&probe)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Webhook connection test failed");
            DiagnosticResponse {
                webhook_url: Some(CONFIGURED.to_string()),
                ..DiagnosticResponse::failure(e.to_string())
            }
        }
    };

    Json(response)
}
