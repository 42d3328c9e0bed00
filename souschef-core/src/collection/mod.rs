//! Per-user recipe collection.
//!
//! [`CollectionGateway`] validates incoming recipes, maps them to the
//! storage row shape and back, and classifies persistence failures. The
//! persistence provider itself sits behind [`RecipeStore`].

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use crate::identity::Identity;
use crate::recipe::{
    normalize, Difficulty, DEFAULT_COOKING_TIME, DEFAULT_DESCRIPTION, DEFAULT_SERVINGS,
};

/// Row to insert. Field names match the storage columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipeRecord {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cooking_time: String,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

/// Stored row as returned by the persistence provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub instructions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Nullable array columns come back as `null` rather than `[]`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Row ids may be UUIDs or serial integers depending on the table setup.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// A saved recipe in display shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub cooking_time: String,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RecipeRecord> for SavedRecipe {
    fn from(record: RecipeRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.user_id,
            title: record.title,
            description: record
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            cooking_time: record
                .cooking_time
                .unwrap_or_else(|| DEFAULT_COOKING_TIME.to_string()),
            servings: record
                .servings
                .and_then(|s| u32::try_from(s).ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_SERVINGS),
            difficulty: record
                .difficulty
                .as_deref()
                .and_then(Difficulty::from_label)
                .unwrap_or_default(),
            ingredients: record.ingredients,
            instructions: record.instructions,
            created_at: record.created_at,
        }
    }
}

/// Raw failure reported by the persistence provider.
///
/// Mirrors the provider's structured error body so it can be echoed back
/// to callers for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Error, ToSchema)]
#[error("{message}")]
pub struct ProviderError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// HTTP status of the provider response, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Classified collection failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("You must be signed in to manage recipes")]
    Unauthenticated,

    #[error("Invalid recipe data: {0}")]
    Validation(String),

    #[error("Database not set up: {0}")]
    Setup(#[source] ProviderError),

    #[error("Authentication error: {0}")]
    Auth(#[source] ProviderError),

    #[error("Permission denied: {0}")]
    Permission(#[source] ProviderError),

    #[error("Database error: {0}")]
    Store(#[source] ProviderError),
}

impl StoreError {
    /// The provider payload behind a classified failure.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            StoreError::Setup(e)
            | StoreError::Auth(e)
            | StoreError::Permission(e)
            | StoreError::Store(e) => Some(e),
            StoreError::Unauthenticated | StoreError::Validation(_) => None,
        }
    }
}

/// Sort a provider failure into an actionable category.
///
/// Structured error codes and HTTP statuses are checked first. Message
/// substring matching is the last resort and lives in
/// [`classify_by_message`].
pub fn classify_provider_error(error: ProviderError) -> StoreError {
    let by_code = match error.code.as_deref() {
        // undefined_table, or the relation is missing from the schema cache
        Some("42P01") | Some("PGRST205") => Some(Category::Setup),
        // JWT missing, invalid or expired
        Some("PGRST300") | Some("PGRST301") | Some("PGRST302") | Some("PGRST303") => {
            Some(Category::Auth)
        }
        // insufficient_privilege, raised by row-level security
        Some("42501") => Some(Category::Permission),
        _ => None,
    };

    let by_status = || match error.status {
        Some(401) => Some(Category::Auth),
        Some(403) => Some(Category::Permission),
        Some(404) => Some(Category::Setup),
        _ => None,
    };

    let category = by_code
        .or_else(by_status)
        .unwrap_or_else(|| classify_by_message(&error.message));

    match category {
        Category::Setup => StoreError::Setup(error),
        Category::Auth => StoreError::Auth(error),
        Category::Permission => StoreError::Permission(error),
        Category::Other => StoreError::Store(error),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Setup,
    Auth,
    Permission,
    Other,
}

fn classify_by_message(message: &str) -> Category {
    if message.contains("relation") && message.contains("does not exist") {
        Category::Setup
    } else if message.contains("JWT") || message.contains("auth") {
        Category::Auth
    } else if message.contains("policy") || message.contains("RLS") {
        Category::Permission
    } else {
        Category::Other
    }
}

/// Trait for the persistence provider holding the recipes relation.
///
/// Every call is scoped by `owner`. Implementations forward the owner's
/// access token so provider-side row policies apply.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Insert a row. The provider assigns `id` and `created_at`.
    async fn insert(
        &self,
        owner: &Identity,
        record: NewRecipeRecord,
    ) -> Result<RecipeRecord, ProviderError>;

    /// Rows owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<RecipeRecord>, ProviderError>;

    /// Delete the row matching both `id` and `owner`. Matching nothing is
    /// not an error.
    async fn delete_by_id_and_owner(&self, id: &str, owner: &Identity)
        -> Result<(), ProviderError>;

    /// Number of rows visible to `viewer` (or anonymously).
    async fn count(&self, viewer: Option<&Identity>) -> Result<u64, ProviderError>;
}

/// Owner-scoped save/list/delete over a [`RecipeStore`].
#[derive(Clone)]
pub struct CollectionGateway {
    store: Arc<dyn RecipeStore>,
}

impl CollectionGateway {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    /// Validate `payload` and save it for `owner`.
    pub async fn save(
        &self,
        payload: &Value,
        owner: Option<&Identity>,
    ) -> Result<SavedRecipe, StoreError> {
        let owner = owner.ok_or(StoreError::Unauthenticated)?;

        let recipe = normalize(payload).map_err(|e| {
            StoreError::Validation(format!(
                "Missing required recipe fields ({})",
                e.missing.join(", ")
            ))
        })?;

        let record = NewRecipeRecord {
            user_id: owner.id.clone(),
            title: recipe.title,
            description: recipe.description,
            cooking_time: recipe.cooking_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
        };

        tracing::debug!(
            owner = %owner.id,
            ingredients = record.ingredients.len(),
            instructions = record.instructions.len(),
            "Saving recipe"
        );

        let saved = self
            .store
            .insert(owner, record)
            .await
            .map_err(classify_provider_error)?;

        Ok(saved.into())
    }

    /// Recipes saved by `owner`, newest first.
    pub async fn list(&self, owner: Option<&Identity>) -> Result<Vec<SavedRecipe>, StoreError> {
        let owner = owner.ok_or(StoreError::Unauthenticated)?;

        let mut records = self
            .store
            .list_by_owner(owner)
            .await
            .map_err(classify_provider_error)?;

        records.retain(|r| r.user_id == owner.id);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records.into_iter().map(SavedRecipe::from).collect())
    }

    /// Delete `id` if `owner` owns it. Deleting someone else's recipe, or
    /// one that doesn't exist, succeeds without removing anything.
    pub async fn delete(&self, id: &str, owner: Option<&Identity>) -> Result<(), StoreError> {
        let owner = owner.ok_or(StoreError::Unauthenticated)?;

        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::Validation("Recipe id is required".to_string()));
        }

        self.store
            .delete_by_id_and_owner(id, owner)
            .await
            .map_err(classify_provider_error)
    }

    /// Number of recipes visible to `viewer`, for diagnostics.
    pub async fn count(&self, viewer: Option<&Identity>) -> Result<u64, StoreError> {
        self.store
            .count(viewer)
            .await
            .map_err(classify_provider_error)
    }
}
