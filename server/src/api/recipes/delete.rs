use crate::api::{ApiError, ErrorResponse, SuccessResponse};
use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// Delete one of the signed-in user's recipes.
///
/// Ids that don't exist or belong to someone else are ignored and still
/// answer `{"success": true}`.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted (or nothing to delete)", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Failed to delete recipe", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .collection()?
        .delete(&id, Some(&user))
        .await
        .map_err(|e| ApiError::from_store_coarse(e, "Failed to delete recipe"))?;

    Ok(SuccessResponse::ok())
}
