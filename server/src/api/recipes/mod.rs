pub mod delete;
pub mod list;
pub mod save;

use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for the saved-recipe collection endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/save-recipe", post(save::save_recipe))
        .route("/api/recipes", get(list::list_recipes))
        .route("/api/recipes/{id}", delete(delete::delete_recipe))
}

#[derive(OpenApi)]
#[openapi(
    paths(save::save_recipe, list::list_recipes, delete::delete_recipe),
    components(schemas(save::SaveRecipeResponse, souschef_core::SavedRecipe))
)]
pub struct ApiDoc;
