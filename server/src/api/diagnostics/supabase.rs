use super::{provider_message, DiagnosticResponse};
use crate::auth::MaybeUser;
use crate::state::AppState;
use axum::{extract::State, Json};

/// Check the auth API, then whether the recipes table can be queried.
#[utoipa::path(
    get,
    path = "/api/test-supabase",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Auth and database connectivity", body = DiagnosticResponse)
    )
)]
pub async fn test_supabase(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Json<DiagnosticResponse> {
    let (Some(identity), Some(collection)) = (state.identity.as_ref(), state.collection.as_ref())
    else {
        return Json(DiagnosticResponse::missing_supabase_config());
    };

    if let Err(e) = identity.check_connection().await {
        tracing::warn!(error = %e, "Supabase auth check failed");
        return Json(DiagnosticResponse::failure(format!(
            "Supabase connection error: {e}"
        )));
    }

    if let Err(e) = collection.count(user.as_ref()).await {
        return Json(DiagnosticResponse {
            warning: Some(format!(
                "Database table not found: {}. You may need to run the setup script.",
                provider_message(&e)
            )),
            ..DiagnosticResponse::new(true)
        });
    }

    Json(DiagnosticResponse {
        user_signed_in: Some(user.is_some()),
        ..DiagnosticResponse::success("Supabase connection successful")
    })
}
