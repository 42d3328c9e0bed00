use super::{provider_message, DiagnosticResponse};
use crate::auth::MaybeUser;
use crate::state::AppState;
use axum::{extract::State, Json};
use souschef_core::StoreError;

/// Check that the recipes table exists and count the rows visible to the
/// caller.
#[utoipa::path(
    get,
    path = "/api/test-database",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Recipes table status", body = DiagnosticResponse)
    )
)]
pub async fn test_database(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Json<DiagnosticResponse> {
    let Some(collection) = state.collection.as_ref() else {
        return Json(DiagnosticResponse::missing_supabase_config());
    };

    let response = match collection.count(user.as_ref()).await {
        Ok(count) => DiagnosticResponse {
            table_exists: Some(true),
            recipe_count: Some(count),
            user_signed_in: Some(user.is_some()),
            user_id: user.map(|u| u.id),
            ..DiagnosticResponse::success("Database connection successful")
        },
        Err(StoreError::Setup(_)) => DiagnosticResponse {
            table_exists: Some(false),
            error: Some(
                "Recipes table does not exist. Please run the database setup script.".to_string(),
            ),
            ..DiagnosticResponse::new(true)
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database check failed");
            DiagnosticResponse::failure(format!("Database error: {}", provider_message(&e)))
        }
    };

    Json(response)
}
