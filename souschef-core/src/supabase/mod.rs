//! Hosted auth and database provider.
//!
//! [`SupabaseAuth`] resolves bearer tokens through the provider's auth API
//! and [`SupabaseStore`] keeps recipes in a table behind its REST API.
//! Both share one [`SupabaseClient`].

mod auth;
mod rest;

pub use auth::SupabaseAuth;
pub use rest::{parse_content_range, SupabaseStore};

use crate::collection::ProviderError;
use crate::config::SupabaseConfig;
use reqwest::{Method, RequestBuilder};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Invalid Supabase URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared HTTP plumbing for the provider's APIs.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base: Url,
    anon_key: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        // A trailing slash keeps `Url::join` from dropping the last path segment.
        let raw = format!("{}/", config.url.trim_end_matches('/'));
        let base = Url::parse(&raw).map_err(|source| SupabaseError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base,
            anon_key: config.anon_key.clone(),
            timeout: config.timeout,
            http,
        })
    }

    /// Absolute URL for a path under the project root, e.g. `auth/v1/user`.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url
    }

    /// Request carrying the project key, authorized as `access_token` when
    /// given and as the anonymous role otherwise.
    pub fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Turn a transport failure into a provider error.
pub(crate) fn transport_error(timeout: Duration, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::new(format!(
            "Supabase request timed out after {}s",
            timeout.as_secs()
        ))
    } else {
        ProviderError::new(format!("Supabase request failed: {err}"))
    }
}

/// Decode an error body from the REST or auth API.
///
/// The REST API answers `{code, message, details, hint}`. The auth API
/// uses `msg`, `error_description` or `error` depending on the endpoint.
pub(crate) fn decode_error_body(status: u16, body: &str) -> ProviderError {
    let mut error = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => {
            let text = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
            let code = text("code").or_else(|| {
                value
                    .get("code")
                    .and_then(|v| v.as_i64())
                    .map(|n| n.to_string())
            });
            let message = text("message")
                .or_else(|| text("msg"))
                .or_else(|| text("error_description"))
                .or_else(|| text("error"))
                .unwrap_or_else(|| format!("HTTP {status}"));

            ProviderError {
                code,
                message,
                details: text("details"),
                hint: text("hint"),
                status: None,
            }
        }
        _ if body.trim().is_empty() => ProviderError::new(format!("HTTP {status}")),
        _ => ProviderError::new(body.trim().to_string()),
    };
    error.status = Some(status);
    error
}
