use crate::api::{ApiError, ErrorResponse};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use utoipa::IntoParams;

const DEFAULT_PROVIDER: &str = "google";

#[derive(Debug, Deserialize, IntoParams)]
pub struct SignInParams {
    /// OAuth provider to sign in with (default: google)
    pub provider: Option<String>,
}

/// Start an OAuth sign-in. The browser is redirected to the identity
/// provider and comes back to the site with a session.
#[utoipa::path(
    get,
    path = "/api/auth/sign-in",
    tag = "auth",
    params(SignInParams),
    responses(
        (status = 307, description = "Redirect to the provider's consent page"),
        (status = 500, description = "Identity provider not configured", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Query(params): Query<SignInParams>,
) -> Result<Redirect, ApiError> {
    let provider = params
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROVIDER);

    let url = state
        .identity_provider()?
        .sign_in_url(provider, &state.site_url);

    Ok(Redirect::temporary(&url))
}
