use super::{ApiError, ErrorResponse, JsonBody};
use crate::auth::MaybeUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use souschef_core::generation::GenerationRequest;
use souschef_core::recipe::Recipe;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateRecipeRequest {
    /// `ingredients` or `dish`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Ingredient list or dish name
    pub input: Option<String>,
}

/// Generate a recipe, trying the workflow webhook first and falling back
/// to the generative API.
#[utoipa::path(
    post,
    path = "/api/generate-recipe",
    tag = "generation",
    request_body(content = GenerateRecipeRequest, example = json!({"type": "ingredients", "input": "chicken, rice, broccoli"})),
    responses(
        (status = 200, description = "Generated recipe", body = Recipe),
        (status = 400, description = "Missing type or input", body = ErrorResponse),
        (status = 500, description = "No generation backend available, or generation failed", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn generate_recipe(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    JsonBody(req): JsonBody<GenerateRecipeRequest>,
) -> Result<Json<Recipe>, ApiError> {
    let request = GenerationRequest::new(req.kind.as_deref(), req.input.as_deref(), identity)?;
    let recipe = state.generator.generate(&request).await?;
    Ok(Json(recipe))
}
