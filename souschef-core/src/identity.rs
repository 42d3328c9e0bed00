//! Identity abstraction over the hosted auth provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The signed-in principal a request acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    /// Token the identity was resolved from. Persistence calls forward it so
    /// the provider's row-level policies see the same user.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider request failed: {0}")]
    RequestFailed(String),

    #[error("Identity provider returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse identity response: {0}")]
    ParseError(String),
}

/// Trait for identity and session providers.
///
/// The OAuth consent flow itself happens in the browser against the
/// provider; the server only resolves tokens and builds redirect URLs.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an access token to the user it belongs to. `Ok(None)` means
    /// the token is missing, expired or revoked.
    async fn current_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError>;

    /// URL that starts an OAuth sign-in with `provider` and returns to
    /// `redirect_to` afterwards.
    fn sign_in_url(&self, provider: &str, redirect_to: &str) -> String;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Cheap reachability check used by diagnostics.
    async fn check_connection(&self) -> Result<(), IdentityError>;
}

/// Identity provider backed by a fixed token table, for tests.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to `identity`.
    pub fn with_user(mut self, token: &str, identity: Identity) -> Self {
        self.users.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(self
            .users
            .get(access_token)
            .cloned()
            .map(|identity| identity.with_access_token(access_token)))
    }

    fn sign_in_url(&self, provider: &str, redirect_to: &str) -> String {
        format!("https://auth.invalid/authorize?provider={provider}&redirect_to={redirect_to}")
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_resolves_known_tokens() {
        let provider = StaticIdentityProvider::new()
            .with_user("tok-a", Identity::new("user-a", Some("a@example.com".into())));

        let user = provider.current_user("tok-a").await.unwrap().unwrap();
        assert_eq!(user.id, "user-a");
        assert_eq!(user.access_token.as_deref(), Some("tok-a"));

        assert!(provider.current_user("nope").await.unwrap().is_none());
    }

    #[test]
    fn test_access_token_is_never_serialized() {
        let identity = Identity::new("u1", None).with_access_token("secret");
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("secret"));
    }
}
