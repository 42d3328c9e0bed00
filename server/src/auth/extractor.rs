use crate::api::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use souschef_core::identity::Identity;

/// Extractor that validates the Authorization header and provides the
/// signed-in identity.
///
/// Use this in any handler that requires authentication:
/// ```ignore
/// async fn my_handler(AuthUser(identity): AuthUser) -> impl IntoResponse {
///     // identity.id is the provider's user id
/// }
/// ```
pub struct AuthUser(pub Identity);

/// Like [`AuthUser`], but anonymous callers get `None` instead of a 401.
pub struct MaybeUser(pub Option<Identity>);

/// The bearer token from the Authorization header, if one was sent.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::invalid_session("Invalid Authorization header"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::invalid_session("Invalid Authorization header format"))?;

    Ok(Some(token))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provider = state.identity_provider()?;

        let token = bearer_token(parts)?.ok_or_else(ApiError::unauthenticated)?;

        let identity = provider.current_user(token).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve access token");
            ApiError::internal("Authentication service error", e.to_string())
        })?;

        identity
            .map(AuthUser)
            .ok_or_else(|| ApiError::invalid_session("Invalid or expired token"))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (Some(provider), Ok(Some(token))) = (state.identity.as_ref(), bearer_token(parts))
        else {
            return Ok(MaybeUser(None));
        };

        match provider.current_user(token).await {
            Ok(identity) => Ok(MaybeUser(identity)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve access token, continuing anonymously");
                Ok(MaybeUser(None))
            }
        }
    }
}
