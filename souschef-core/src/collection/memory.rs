//! In-memory recipe store for testing.

use super::{NewRecipeRecord, ProviderError, RecipeRecord, RecipeStore};
use crate::identity::Identity;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<RecipeRecord>,
    failure: Option<ProviderError>,
}

/// A [`RecipeStore`] that keeps rows in a vector.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a row as-is, bypassing validation.
    pub fn seed(&self, record: RecipeRecord) {
        self.lock().rows.push(record);
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: ProviderError) {
        self.lock().failure = Some(error);
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(inner: &Inner) -> Result<(), ProviderError> {
        match &inner.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn insert(
        &self,
        _owner: &Identity,
        record: NewRecipeRecord,
    ) -> Result<RecipeRecord, ProviderError> {
        let mut inner = self.lock();
        Self::check(&inner)?;

        let row = RecipeRecord {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id,
            title: record.title,
            description: Some(record.description),
            cooking_time: Some(record.cooking_time),
            servings: Some(i64::from(record.servings)),
            difficulty: Some(record.difficulty.as_str().to_string()),
            ingredients: record.ingredients,
            instructions: record.instructions,
            created_at: Utc::now(),
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<RecipeRecord>, ProviderError> {
        let inner = self.lock();
        Self::check(&inner)?;

        let mut rows: Vec<RecipeRecord> = inner
            .rows
            .iter()
            .filter(|r| r.user_id == owner.id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete_by_id_and_owner(
        &self,
        id: &str,
        owner: &Identity,
    ) -> Result<(), ProviderError> {
        let mut inner = self.lock();
        Self::check(&inner)?;

        inner.rows.retain(|r| !(r.id == id && r.user_id == owner.id));
        Ok(())
    }

    async fn count(&self, _viewer: Option<&Identity>) -> Result<u64, ProviderError> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok(inner.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Difficulty;

    fn new_record(owner: &str, title: &str) -> NewRecipeRecord {
        NewRecipeRecord {
            user_id: owner.to_string(),
            title: title.to_string(),
            description: "desc".to_string(),
            cooking_time: "5 minutes".to_string(),
            servings: 1,
            difficulty: Difficulty::Easy,
            ingredients: vec!["egg".to_string()],
            instructions: vec!["Fry".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = InMemoryStore::new();
        let owner = Identity::new("alice", None);

        let a = store.insert(&owner, new_record("alice", "A")).await.unwrap();
        let b = store.insert(&owner, new_record("alice", "B")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.difficulty.as_deref(), Some("Easy"));
        assert_eq!(store.count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::new();
        store.fail_with(ProviderError::new("boom").with_status(500));

        let err = store
            .list_by_owner(&Identity::new("alice", None))
            .await
            .unwrap_err();
        assert_eq!(err.message, "boom");
        assert!(store.is_empty());
    }
}
