//! Configuration from environment variables.
//!
//! Every external dependency is optional at load time. A missing variable, an
//! empty one, or one still holding the example value from the setup docs all
//! mean "not configured", and the component that needs it decides whether
//! that is fatal.

use std::time::Duration;
use thiserror::Error;

pub const WEBHOOK_URL_PLACEHOLDER: &str = "https://your-n8n-instance.com/webhook/recipe-generator";
pub const WEBHOOK_KEY_PLACEHOLDER: &str = "your-n8n-api-key-optional";
pub const GEMINI_KEY_PLACEHOLDER: &str = "your_google_genai_api_key";
pub const SUPABASE_URL_PLACEHOLDER: &str = "https://your-project.supabase.co";
pub const SUPABASE_KEY_PLACEHOLDER: &str = "your-anon-key";

const PLACEHOLDERS: &[&str] = &[
    WEBHOOK_URL_PLACEHOLDER,
    WEBHOOK_KEY_PLACEHOLDER,
    GEMINI_KEY_PLACEHOLDER,
    SUPABASE_URL_PLACEHOLDER,
    SUPABASE_KEY_PLACEHOLDER,
];

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_RECIPES_TABLE: &str = "recipes";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_GEMINI_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Returns the trimmed value if it is set and is not a known placeholder.
pub fn configured(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !PLACEHOLDERS.contains(&v.as_str()))
}

/// Workflow webhook backend settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }
}

/// Generative language API settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_GEMINI_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Hosted auth + database settings. Only present when both URL and key are.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook: WebhookConfig,
    pub gemini: GeminiConfig,
    pub supabase: Option<SupabaseConfig>,
    pub bind_addr: String,
    /// Where the browser is sent back to after signing in.
    pub site_url: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Generation:
    /// - `N8N_WEBHOOK_URL`, `N8N_API_KEY`, `SOUSCHEF_WEBHOOK_TIMEOUT_SECS`
    /// - `GOOGLE_GENAI_API_KEY`, `SOUSCHEF_GEMINI_MODEL`, `SOUSCHEF_GEMINI_BASE_URL`,
    ///   `SOUSCHEF_GEMINI_TIMEOUT_SECS`
    ///
    /// Persistence and identity:
    /// - `SUPABASE_URL` / `NEXT_PUBLIC_SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY` / `NEXT_PUBLIC_SUPABASE_ANON_KEY`
    /// - `SOUSCHEF_RECIPES_TABLE`, `SOUSCHEF_STORE_TIMEOUT_SECS`
    ///
    /// Server:
    /// - `SOUSCHEF_BIND_ADDR`, `SOUSCHEF_SITE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| configured(lookup(name));
        let get_any = |names: &[&str]| names.iter().find_map(|name| get(*name));

        let webhook = WebhookConfig {
            url: get("N8N_WEBHOOK_URL"),
            api_key: get("N8N_API_KEY"),
            timeout: parse_secs(
                "SOUSCHEF_WEBHOOK_TIMEOUT_SECS",
                get("SOUSCHEF_WEBHOOK_TIMEOUT_SECS"),
                DEFAULT_WEBHOOK_TIMEOUT,
            )?,
        };

        let gemini = GeminiConfig {
            api_key: get("GOOGLE_GENAI_API_KEY"),
            model: get("SOUSCHEF_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: get("SOUSCHEF_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout: parse_secs(
                "SOUSCHEF_GEMINI_TIMEOUT_SECS",
                get("SOUSCHEF_GEMINI_TIMEOUT_SECS"),
                DEFAULT_GEMINI_TIMEOUT,
            )?,
            ..GeminiConfig::default()
        };

        let store_timeout = parse_secs(
            "SOUSCHEF_STORE_TIMEOUT_SECS",
            get("SOUSCHEF_STORE_TIMEOUT_SECS"),
            DEFAULT_STORE_TIMEOUT,
        )?;

        let supabase = match (
            get_any(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]),
            get_any(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]),
        ) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
                table: get("SOUSCHEF_RECIPES_TABLE")
                    .unwrap_or_else(|| DEFAULT_RECIPES_TABLE.to_string()),
                timeout: store_timeout,
            }),
            _ => None,
        };

        Ok(Self {
            webhook,
            gemini,
            supabase,
            bind_addr: get("SOUSCHEF_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            site_url: get("SOUSCHEF_SITE_URL")
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn parse_secs(
    name: &'static str,
    value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "timeout must be at least one second".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
