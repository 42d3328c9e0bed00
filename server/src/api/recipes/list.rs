use crate::api::{ApiError, ErrorResponse};
use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use souschef_core::SavedRecipe;

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "Saved recipes, newest first", body = Vec<SavedRecipe>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Failed to fetch recipes", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SavedRecipe>>, ApiError> {
    let recipes = state
        .collection()?
        .list(Some(&user))
        .await
        .map_err(|e| ApiError::from_store_coarse(e, "Failed to fetch recipes"))?;

    Ok(Json(recipes))
}
