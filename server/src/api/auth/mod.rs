pub mod me;
pub mod sign_in;
pub mod sign_out;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/auth endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-in", get(sign_in::sign_in))
        .route("/api/auth/sign-out", post(sign_out::sign_out))
        .route("/api/auth/me", get(me::me))
}

#[derive(OpenApi)]
#[openapi(
    paths(sign_in::sign_in, sign_out::sign_out, me::me),
    components(schemas(me::MeResponse))
)]
pub struct ApiDoc;
