//! Google generative language API backend.

use super::prompts::{render_recipe_prompt, CONNECTION_TEST_PROMPT};
use super::{AdapterError, GenerationRequest, RecipeBackend};
use crate::config::GeminiConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Provenance tag for recipes produced by this backend.
pub const GEMINI_SOURCE: &str = "google-gemini-direct";

const BACKEND: &str = "gemini";
const CONNECTION_TEST_MAX_TOKENS: u32 = 10;

/// Greedy match from the first `{` to the last `}`.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// generateContent request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

/// generateContent response format.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

/// Generative language backend. Not configured without an API key.
#[derive(Debug)]
pub struct GeminiBackend {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    temperature: f32,
    max_output_tokens: u32,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send a single-turn prompt and return the first candidate's text.
    async fn complete(
        &self,
        prompt: &str,
        temperature: Option<f32>,
        max_output_tokens: u32,
    ) -> Result<String, AdapterError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::NotConfigured {
                backend: BACKEND,
                message: "GOOGLE_GENAI_API_KEY not set".to_string(),
            })?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(BACKEND, self.timeout, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::from_reqwest(BACKEND, self.timeout, e))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdapterError::ApiError {
                backend: BACKEND,
                status,
                message,
            });
        }

        let response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| AdapterError::ParseError {
                backend: BACKEND,
                message: e.to_string(),
            })?;

        first_candidate_text(response)
    }

    /// Ask for a one-word reply to verify the key and endpoint.
    pub async fn ping(&self) -> Result<String, AdapterError> {
        self.complete(CONNECTION_TEST_PROMPT, None, CONNECTION_TEST_MAX_TOKENS)
            .await
    }
}

fn first_candidate_text(response: GenerateContentResponse) -> Result<String, AdapterError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| AdapterError::ParseError {
            backend: BACKEND,
            message: "Invalid Gemini API response structure".to_string(),
        })
}

/// Pull a JSON object out of model output.
///
/// Code fences are stripped first. If the remainder still isn't valid JSON,
/// the span from the first `{` to the last `}` is tried before giving up.
pub fn extract_json(text: &str) -> Result<Value, AdapterError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str(cleaned) {
        return Ok(value);
    }

    let object = JSON_OBJECT
        .find(cleaned)
        .ok_or_else(|| AdapterError::ParseError {
            backend: BACKEND,
            message: "Could not parse JSON from Gemini response".to_string(),
        })?;

    serde_json::from_str(object.as_str()).map_err(|e| AdapterError::ParseError {
        backend: BACKEND,
        message: format!("Could not parse JSON from Gemini response: {e}"),
    })
}

#[async_trait]
impl RecipeBackend for GeminiBackend {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn source(&self) -> &'static str {
        GEMINI_SOURCE
    }

    fn model_name(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, AdapterError> {
        let prompt = render_recipe_prompt(request.kind, &request.input);

        tracing::debug!(model = %self.model, kind = %request.kind, "Calling Gemini API");

        let text = self
            .complete(&prompt, Some(self.temperature), self.max_output_tokens)
            .await?;

        extract_json(&text)
    }
}
