pub mod collection;
pub mod config;
pub mod generation;
pub mod identity;
pub mod recipe;
pub mod supabase;

pub use collection::{
    classify_provider_error, CollectionGateway, InMemoryStore, NewRecipeRecord, ProviderError,
    RecipeRecord, RecipeStore, SavedRecipe, StoreError,
};
pub use config::{Config, ConfigError};
pub use generation::{
    AdapterError, FakeBackend, GeminiBackend, GenerationError, GenerationKind, GenerationRequest,
    RecipeBackend, RecipeGenerator, WebhookBackend,
};
pub use identity::{Identity, IdentityError, IdentityProvider, StaticIdentityProvider};
pub use recipe::{normalize, Difficulty, Provenance, Recipe, SchemaError};
pub use supabase::{SupabaseAuth, SupabaseClient, SupabaseError, SupabaseStore};
