use crate::api::ApiError;
use anyhow::Context;
use souschef_core::config::Config;
use souschef_core::generation::{GeminiBackend, RecipeGenerator, WebhookBackend};
use souschef_core::identity::IdentityProvider;
use souschef_core::supabase::{SupabaseAuth, SupabaseClient, SupabaseStore};
use souschef_core::CollectionGateway;
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// Identity and collection are `None` when the hosted backend isn't
/// configured; handlers that need them answer with a configuration error.
#[derive(Clone)]
pub struct AppState {
    pub generator: RecipeGenerator,
    pub webhook: Arc<WebhookBackend>,
    pub gemini: Arc<GeminiBackend>,
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub collection: Option<CollectionGateway>,
    /// Where the browser lands after signing in.
    pub site_url: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let webhook = Arc::new(
            WebhookBackend::new(&config.webhook).context("Failed to build webhook client")?,
        );
        let gemini =
            Arc::new(GeminiBackend::new(&config.gemini).context("Failed to build Gemini client")?);
        let generator = RecipeGenerator::new(webhook.clone(), gemini.clone());

        let (identity, collection) = match &config.supabase {
            Some(supabase) => {
                let client =
                    SupabaseClient::new(supabase).context("Failed to build Supabase client")?;
                let identity: Arc<dyn IdentityProvider> =
                    Arc::new(SupabaseAuth::new(client.clone()));
                let store = Arc::new(SupabaseStore::new(client, supabase.table.clone()));
                (Some(identity), Some(CollectionGateway::new(store)))
            }
            None => {
                tracing::warn!("Supabase is not configured; auth and saved recipes are disabled");
                (None, None)
            }
        };

        if !generator.has_configured_backend() {
            tracing::warn!(
                "Neither N8N_WEBHOOK_URL nor GOOGLE_GENAI_API_KEY is set; generation will fail"
            );
        }

        Ok(Self {
            generator,
            webhook,
            gemini,
            identity,
            collection,
            site_url: config.site_url.clone(),
        })
    }

    pub fn identity_provider(&self) -> Result<&Arc<dyn IdentityProvider>, ApiError> {
        self.identity
            .as_ref()
            .ok_or_else(ApiError::missing_supabase_config)
    }

    pub fn collection(&self) -> Result<&CollectionGateway, ApiError> {
        self.collection
            .as_ref()
            .ok_or_else(ApiError::missing_supabase_config)
    }
}
