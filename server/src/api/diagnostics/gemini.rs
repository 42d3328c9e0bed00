use super::DiagnosticResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use souschef_core::generation::{AdapterError, RecipeBackend};

/// Turn a failed test prompt into something a person can act on.
fn describe_failure(error: &AdapterError) -> String {
    match error {
        AdapterError::ApiError { status: 401, .. } => "Invalid Gemini API key".to_string(),
        AdapterError::ApiError { status: 429, .. } => {
            "Gemini API rate limit exceeded or insufficient quota".to_string()
        }
        AdapterError::ApiError {
            status, message, ..
        } => format!("Gemini API returned {status}: {message}"),
        other if other.to_string().contains("quota") => {
            "Gemini API quota exceeded - please check your usage".to_string()
        }
        other => other.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/test-gemini",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Generative API connectivity", body = DiagnosticResponse)
    )
)]
pub async fn test_gemini(State(state): State<AppState>) -> Json<DiagnosticResponse> {
    if !state.gemini.is_configured() {
        return Json(DiagnosticResponse::failure(
            "GOOGLE_GENAI_API_KEY environment variable is not set",
        ));
    }

    let response = match state.gemini.ping().await {
        Ok(text) => DiagnosticResponse {
            test_response: Some(text),
            ..DiagnosticResponse::success("Gemini API connection successful")
        },
        // The key and endpoint work even if the reply had no text in it.
        Err(AdapterError::ParseError { .. }) => {
            DiagnosticResponse::success("Gemini API connection successful")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Gemini connection test failed");
            DiagnosticResponse::failure(describe_failure(&e))
        }
    };

    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, message: &str) -> AdapterError {
        AdapterError::ApiError {
            backend: "gemini",
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_describe_failure() {
        assert_eq!(
            describe_failure(&api_error(401, "API key not valid")),
            "Invalid Gemini API key"
        );
        assert_eq!(
            describe_failure(&api_error(429, "Resource exhausted")),
            "Gemini API rate limit exceeded or insufficient quota"
        );
        assert_eq!(
            describe_failure(&api_error(404, "model not found")),
            "Gemini API returned 404: model not found"
        );
        assert_eq!(
            describe_failure(&AdapterError::RequestFailed {
                backend: "gemini",
                message: "quota check failed".to_string(),
            }),
            "Gemini API quota exceeded - please check your usage"
        );
    }
}
