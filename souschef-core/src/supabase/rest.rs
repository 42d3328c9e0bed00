use super::{decode_error_body, transport_error, SupabaseClient};
use crate::collection::{NewRecipeRecord, ProviderError, RecipeRecord, RecipeStore};
use crate::identity::Identity;
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, Response};
use url::Url;

/// Recipe table behind the hosted REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: SupabaseClient,
    table: String,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_url(&self, filters: &[(&str, String)]) -> Url {
        let mut url = self.client.endpoint(&format!("rest/v1/{}", self.table));
        if !filters.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in filters {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(self.client.timeout(), e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = decode_error_body(status.as_u16(), &body);
        tracing::warn!(
            table = %self.table,
            status = status.as_u16(),
            code = error.code.as_deref().unwrap_or(""),
            message = %error.message,
            "Supabase REST request failed"
        );
        Err(error)
    }

    async fn rows(&self, response: Response) -> Result<Vec<RecipeRecord>, ProviderError> {
        let status = response.status().as_u16();
        response.json().await.map_err(|e| {
            ProviderError::new(format!("Failed to parse Supabase response: {e}")).with_status(status)
        })
    }
}

#[async_trait]
impl RecipeStore for SupabaseStore {
    async fn insert(
        &self,
        owner: &Identity,
        record: NewRecipeRecord,
    ) -> Result<RecipeRecord, ProviderError> {
        let request = self
            .client
            .request(
                Method::POST,
                self.table_url(&[]),
                owner.access_token.as_deref(),
            )
            .header("Prefer", "return=representation")
            .json(&record);

        let response = self.send(request).await?;
        self.rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("Insert returned no rows"))
    }

    async fn list_by_owner(&self, owner: &Identity) -> Result<Vec<RecipeRecord>, ProviderError> {
        let url = self.table_url(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", owner.id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let request = self
            .client
            .request(Method::GET, url, owner.access_token.as_deref());

        let response = self.send(request).await?;
        self.rows(response).await
    }

    async fn delete_by_id_and_owner(
        &self,
        id: &str,
        owner: &Identity,
    ) -> Result<(), ProviderError> {
        let url = self.table_url(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{}", owner.id)),
        ]);
        let request = self
            .client
            .request(Method::DELETE, url, owner.access_token.as_deref());

        self.send(request).await?;
        Ok(())
    }

    async fn count(&self, viewer: Option<&Identity>) -> Result<u64, ProviderError> {
        let url = self.table_url(&[("select", "id".to_string())]);
        let token = viewer.and_then(|v| v.access_token.as_deref());
        let request = self
            .client
            .request(Method::GET, url, token)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0");

        let response = self.send(request).await?;
        let status = response.status().as_u16();
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                ProviderError::new("Missing or malformed Content-Range header").with_status(status)
            })
    }
}

/// Total from a `Content-Range` header such as `0-0/42` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use std::time::Duration;

    fn store() -> SupabaseStore {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            table: "recipes".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        SupabaseStore::new(client, "recipes")
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-0/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range(" 0-24/3573458 "), Some(3573458));
        assert_eq!(parse_content_range("0-0/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_table_url_filters() {
        let url = store().table_url(&[
            ("id", "eq.abc".to_string()),
            ("user_id", "eq.u-1".to_string()),
        ]);
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/recipes?id=eq.abc&user_id=eq.u-1"
        );

        let url = store().table_url(&[]);
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/recipes");
    }
}
