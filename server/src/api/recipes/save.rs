use crate::api::{ApiError, ErrorResponse, JsonBody};
use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use souschef_core::recipe::Recipe;
use souschef_core::SavedRecipe;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaveRecipeResponse {
    pub success: bool,
    pub recipe: SavedRecipe,
}

/// Save a recipe to the signed-in user's collection.
///
/// The body goes through the same normalization as generated recipes, so
/// loosely shaped input is repaired and defaults are filled in.
#[utoipa::path(
    post,
    path = "/api/save-recipe",
    tag = "recipes",
    request_body = Recipe,
    responses(
        (status = 200, description = "Recipe saved", body = SaveRecipeResponse),
        (status = 400, description = "Invalid recipe data", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Blocked by row-level security", body = ErrorResponse),
        (status = 500, description = "Database missing or failing", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<SaveRecipeResponse>, ApiError> {
    let recipe = state
        .collection()?
        .save(&payload, Some(&user))
        .await?;

    tracing::info!(recipe_id = %recipe.id, "Recipe saved");

    Ok(Json(SaveRecipeResponse {
        success: true,
        recipe,
    }))
}
