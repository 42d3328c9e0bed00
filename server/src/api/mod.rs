pub mod auth;
pub mod diagnostics;
pub mod generate;
pub mod recipes;

#[cfg(test)]
mod tests;

use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use souschef_core::collection::{ProviderError, StoreError};
use souschef_core::generation::GenerationError;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Short label
    pub error: String,
    /// Longer explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Raw persistence provider error, for diagnosing setup problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<ProviderError>,
}

/// Body of endpoints that only report success
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// A terminal failure, rendered as [`ErrorResponse`] with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                details: None,
                provider_error: None,
            },
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    fn with_provider_error(mut self, error: Option<&ProviderError>) -> Self {
        self.body.provider_error = error.cloned();
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    /// A 401 telling the caller to sign in again.
    pub fn invalid_session(error: impl Into<String>) -> Self {
        Self::unauthorized(error)
            .with_details("Sign in again and retry with a fresh access token")
    }

    pub fn unauthenticated() -> Self {
        Self::unauthorized("Authentication required")
            .with_details("You must be signed in to manage recipes")
    }

    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_details(details)
    }

    pub fn missing_supabase_config() -> Self {
        Self::internal(
            "Server configuration error",
            "Missing Supabase environment variables",
        )
    }

    /// Map a collection failure. `label` names the operation for failures
    /// that fit no more specific category.
    pub fn from_store(error: StoreError, label: &str) -> Self {
        let provider = error.provider_error();
        let api_error = match &error {
            StoreError::Unauthenticated => Self::unauthenticated(),
            StoreError::Validation(message) => {
                Self::bad_request("Invalid recipe data").with_details(message.clone())
            }
            StoreError::Setup(_) => Self::internal(
                "Database not set up",
                "The recipes table does not exist in your Supabase database. \
                 Please run the database setup script.",
            ),
            StoreError::Auth(_) => Self::unauthorized("Authentication error")
                .with_details("Please sign in again to manage recipes."),
            StoreError::Permission(_) => Self::new(StatusCode::FORBIDDEN, "Permission denied")
                .with_details(
                    "Database security policies prevent this operation. \
                     Please check your Supabase RLS configuration.",
                ),
            StoreError::Store(e) => Self::internal(label, e.message.clone()),
        };

        if api_error.status.is_server_error() {
            tracing::error!(error = %error, "{label}");
        } else {
            tracing::warn!(error = %error, "{label}");
        }

        api_error.with_provider_error(provider)
    }

    /// Like [`ApiError::from_store`] for routes that only answer 401 or 500.
    /// Session failures stay 401; anything else becomes a 500 under `label`.
    pub fn from_store_coarse(error: StoreError, label: &str) -> Self {
        match error {
            StoreError::Unauthenticated | StoreError::Auth(_) | StoreError::Setup(_) => {
                Self::from_store(error, label)
            }
            StoreError::Validation(message) => {
                tracing::error!(error = %message, "{label}");
                Self::internal(label, message)
            }
            StoreError::Permission(e) | StoreError::Store(e) => {
                Self::from_store(StoreError::Store(e), label)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::from_store(error, "Database error")
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::Validation(message) => Self::bad_request(message).with_details(
                "Request body must include a non-empty `type` (\"ingredients\" or \"dish\") and `input`",
            ),
            GenerationError::NoBackendAvailable { details } => Self::internal(
                "No recipe generation method available. \
                 Please configure N8N_WEBHOOK_URL or GOOGLE_GENAI_API_KEY.",
                details,
            ),
            GenerationError::Failed { details } => {
                Self::internal("Failed to generate recipe", details)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// JSON body extractor whose rejections use [`ErrorResponse`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::new(rejection.status(), "Invalid request body")
                    .with_details(rejection.body_text())
            })?;
        Ok(JsonBody(value))
    }
}

/// Returns the router for every API endpoint
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate-recipe", post(generate::generate_recipe))
        .merge(recipes::router())
        .merge(auth::router())
        .merge(diagnostics::router())
        .with_state(state)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "souschef", description = "AI recipe generation and collection API"),
        paths(generate::generate_recipe),
        components(schemas(
            ErrorResponse,
            SuccessResponse,
            ProviderError,
            generate::GenerateRecipeRequest,
            souschef_core::recipe::Recipe,
            souschef_core::recipe::Difficulty,
            souschef_core::generation::GenerationKind,
        ))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        recipes::ApiDoc::openapi(),
        auth::ApiDoc::openapi(),
        diagnostics::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
