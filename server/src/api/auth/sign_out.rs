use crate::api::{ApiError, ErrorResponse, SuccessResponse};
use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "auth",
    responses(
        (status = 200, description = "Session revoked", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SuccessResponse>, ApiError> {
    if let Some(token) = user.access_token.as_deref() {
        state
            .identity_provider()?
            .sign_out(token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign out");
                ApiError::internal("Failed to sign out", e.to_string())
            })?;
    }

    Ok(SuccessResponse::ok())
}
