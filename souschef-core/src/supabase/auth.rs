use super::{decode_error_body, SupabaseClient};
use crate::identity::{Identity, IdentityError, IdentityProvider};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

/// User object returned by `GET /auth/v1/user`.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Identity provider backed by the hosted auth API.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn request_failed(err: reqwest::Error) -> IdentityError {
        IdentityError::RequestFailed(err.to_string())
    }

    async fn api_error(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        IdentityError::ApiError {
            status,
            message: decode_error_body(status, &body).message,
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn current_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let url = self.client.endpoint("auth/v1/user");
        let response = self
            .client
            .request(Method::GET, url, Some(access_token))
            .send()
            .await
            .map_err(Self::request_failed)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            s if !s.is_success() => return Err(Self::api_error(response).await),
            _ => {}
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| IdentityError::ParseError(e.to_string()))?;

        Ok(Some(
            Identity::new(user.id, user.email).with_access_token(access_token),
        ))
    }

    fn sign_in_url(&self, provider: &str, redirect_to: &str) -> String {
        let mut url = self.client.endpoint("auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);
        url.into()
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.client.endpoint("auth/v1/logout");
        let response = self
            .client
            .request(Method::POST, url, Some(access_token))
            .send()
            .await
            .map_err(Self::request_failed)?;

        match response.status() {
            // An expired or already-revoked session is as signed out as it gets.
            s if s.is_success() || s == StatusCode::UNAUTHORIZED => Ok(()),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn check_connection(&self) -> Result<(), IdentityError> {
        let url = self.client.endpoint("auth/v1/health");
        let response = self
            .client
            .request(Method::GET, url, None)
            .send()
            .await
            .map_err(Self::request_failed)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use std::time::Duration;

    #[test]
    fn test_sign_in_url_encodes_redirect() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            table: "recipes".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let auth = SupabaseAuth::new(client);

        let url = auth.sign_in_url("google", "http://localhost:3000/auth/callback?next=/");
        assert_eq!(
            url,
            "https://abc.supabase.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback%3Fnext%3D%2F"
        );
    }
}
