//! Workflow-automation webhook backend.

use super::{AdapterError, GenerationRequest, RecipeBackend};
use crate::config::WebhookConfig;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Provenance tag for recipes produced by the webhook.
pub const WEBHOOK_SOURCE: &str = "n8n-webhook";

/// Value of the `source` field sent in every webhook payload.
pub const PAYLOAD_SOURCE: &str = "ai-recipe-generator";

const BACKEND: &str = "n8n";
const ANONYMOUS_EMAIL: &str = "anonymous@example.com";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Body posted to the webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    input: &'a str,
    user_id: &'a str,
    user_email: &'a str,
    timestamp: String,
    source: &'a str,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone)]
pub struct WebhookProbe {
    pub status: u16,
    pub body: String,
}

impl WebhookProbe {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Webhook backend. Not configured when no URL is set.
#[derive(Debug)]
pub struct WebhookBackend {
    url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookBackend {
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            client,
        })
    }

    fn url(&self) -> Result<&str, AdapterError> {
        self.url.as_deref().ok_or_else(|| AdapterError::NotConfigured {
            backend: BACKEND,
            message: "N8N_WEBHOOK_URL not set".to_string(),
        })
    }

    async fn post(
        &self,
        payload: &WebhookPayload<'_>,
        timeout: Duration,
    ) -> Result<reqwest::Response, AdapterError> {
        let mut request = self.client.post(self.url()?).timeout(timeout).json(payload);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        request
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(BACKEND, timeout, e))
    }

    /// Post a `type: "test"` payload and report what came back.
    pub async fn probe(&self) -> Result<WebhookProbe, AdapterError> {
        let payload = WebhookPayload {
            kind: "test",
            input: "connection test",
            user_id: "test-user",
            user_email: ANONYMOUS_EMAIL,
            timestamp: timestamp(),
            source: "connection-test",
        };

        let response = self.post(&payload, PROBE_TIMEOUT).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::from_reqwest(BACKEND, PROBE_TIMEOUT, e))?;

        Ok(WebhookProbe { status, body })
    }
}

#[async_trait]
impl RecipeBackend for WebhookBackend {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn source(&self) -> &'static str {
        WEBHOOK_SOURCE
    }

    fn model_name(&self) -> Option<&str> {
        None
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, AdapterError> {
        let identity = request.identity.as_ref();
        let payload = WebhookPayload {
            kind: request.kind.as_str(),
            input: &request.input,
            user_id: request.user_id(),
            user_email: identity
                .and_then(|i| i.email.as_deref())
                .unwrap_or(ANONYMOUS_EMAIL),
            timestamp: timestamp(),
            source: PAYLOAD_SOURCE,
        };

        tracing::debug!(kind = %request.kind, "Calling recipe webhook");

        let response = self.post(&payload, self.timeout).await?;
        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::from_reqwest(BACKEND, self.timeout, e))?;

        if !status.is_success() {
            return Err(AdapterError::ApiError {
                backend: BACKEND,
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AdapterError::ParseError {
            backend: BACKEND,
            message: e.to_string(),
        })
    }
}
