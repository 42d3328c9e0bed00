use super::router;
use crate::state::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use souschef_core::collection::{CollectionGateway, InMemoryStore, ProviderError};
use souschef_core::config::{GeminiConfig, WebhookConfig};
use souschef_core::generation::{
    FakeBackend, GeminiBackend, RecipeGenerator, WebhookBackend, GEMINI_SOURCE, WEBHOOK_SOURCE,
};
use souschef_core::identity::{Identity, IdentityProvider, StaticIdentityProvider};
use std::sync::Arc;
use tower::ServiceExt;

const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";

fn recipe_json(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Crispy and quick",
        "cookingTime": "20 minutes",
        "servings": 2,
        "difficulty": "Easy",
        "ingredients": ["2 eggs", "butter"],
        "instructions": ["Melt butter", "Fry eggs"]
    })
}

struct Harness {
    app: Router,
    store: Arc<InMemoryStore>,
}

impl Harness {
    fn new(generator: RecipeGenerator, with_supabase: bool) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            StaticIdentityProvider::new()
                .with_user(
                    ALICE_TOKEN,
                    Identity::new("alice", Some("alice@example.com".into())),
                )
                .with_user(BOB_TOKEN, Identity::new("bob", None)),
        );

        let state = AppState {
            generator,
            webhook: Arc::new(WebhookBackend::new(&WebhookConfig::default()).unwrap()),
            gemini: Arc::new(GeminiBackend::new(&GeminiConfig::default()).unwrap()),
            identity: with_supabase.then_some(identity),
            collection: with_supabase.then(|| CollectionGateway::new(store.clone())),
            site_url: "http://localhost:3000".to_string(),
        };

        Self {
            app: router(state),
            store,
        }
    }

    fn with_store() -> Self {
        Self::new(generator_returning(recipe_json("Fried Eggs")), true)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn generator_returning(candidate: Value) -> RecipeGenerator {
    RecipeGenerator::new(
        Arc::new(FakeBackend::returning(WEBHOOK_SOURCE, candidate)),
        Arc::new(FakeBackend::unconfigured(GEMINI_SOURCE)),
    )
}

#[tokio::test]
async fn test_generate_returns_normalized_recipe() {
    let harness = Harness::new(
        generator_returning(json!({
            "title": "Omelette",
            "ingredients": "eggs",
            "instructions": ["Whisk", "Cook"]
        })),
        false,
    );

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"type": "ingredients", "input": "eggs"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Omelette");
    assert_eq!(body["ingredients"], json!(["eggs"]));
    assert_eq!(body["servings"], 4);
    assert_eq!(body["difficulty"], "Medium");
    assert_eq!(body["source"], "n8n-webhook");
    assert_eq!(body["userId"], "anonymous");
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn test_generate_records_signed_in_user() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/generate-recipe",
            Some(ALICE_TOKEN),
            Some(json!({"type": "dish", "input": "eggs"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "alice");
}

#[tokio::test]
async fn test_generate_requires_type_and_input() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"type": "dish", "input": "  "})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields: type and input");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_generate_rejects_malformed_json() {
    let harness = Harness::with_store();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate-recipe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_without_backends_is_a_configuration_error() {
    let harness = Harness::new(
        RecipeGenerator::new(
            Arc::new(FakeBackend::unconfigured(WEBHOOK_SOURCE)),
            Arc::new(FakeBackend::unconfigured(GEMINI_SOURCE)),
        ),
        false,
    );

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/generate-recipe",
            None,
            Some(json!({"type": "dish", "input": "soup"})),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("No recipe generation method available"));
}

#[tokio::test]
async fn test_save_list_delete_round_trip() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(recipe_json("Fried Eggs")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["recipe"]["ownerId"], "alice");
    assert_eq!(body["recipe"]["cookingTime"], "20 minutes");
    let id = body["recipe"]["id"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(Method::GET, "/api/recipes", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Fried Eggs");

    let (status, body) = harness
        .send(Method::GET, "/api/recipes", Some(BOB_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = harness
        .send(
            Method::DELETE,
            &format!("/api/recipes/{id}"),
            Some(ALICE_TOKEN),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_cross_owner_delete_succeeds_without_deleting() {
    let harness = Harness::with_store();

    let (_, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(recipe_json("Fried Eggs")),
        )
        .await;
    let id = body["recipe"]["id"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(
            Method::DELETE,
            &format!("/api/recipes/{id}"),
            Some(BOB_TOKEN),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_collection_requires_authentication() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            None,
            Some(recipe_json("Fried Eggs")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
    assert!(body["details"].is_string());

    let (status, body) = harness
        .send(Method::GET, "/api/recipes", Some("expired-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
    assert!(body["details"].is_string());

    let (status, body) = harness
        .send(Method::DELETE, "/api/recipes/abc", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_malformed_authorization_header_is_rejected() {
    let harness = Harness::with_store();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/recipes")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid Authorization header format");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_save_rejects_incomplete_recipe() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(json!({"title": "", "ingredients": ["a"], "instructions": ["b"]})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid recipe data");
    assert!(body["details"].as_str().unwrap().contains("title"));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_save_surfaces_classified_provider_errors() {
    let harness = Harness::with_store();
    harness.store.fail_with(
        ProviderError::new("new row violates row-level security policy").with_code("42501"),
    );

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(recipe_json("Fried Eggs")),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission denied");
    assert_eq!(body["providerError"]["code"], "42501");
}

#[tokio::test]
async fn test_list_reports_missing_table() {
    let harness = Harness::with_store();
    harness.store.fail_with(
        ProviderError::new("relation \"public.recipes\" does not exist").with_code("42P01"),
    );

    let (status, body) = harness
        .send(Method::GET, "/api/recipes", Some(ALICE_TOKEN), None)
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database not set up");
}

#[tokio::test]
async fn test_list_and_delete_report_other_store_failures_as_server_errors() {
    let harness = Harness::with_store();
    harness.store.fail_with(
        ProviderError::new("permission denied for table recipes").with_code("42501"),
    );

    let (status, body) = harness
        .send(Method::GET, "/api/recipes", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch recipes");
    assert_eq!(body["providerError"]["code"], "42501");

    let (status, body) = harness
        .send(Method::DELETE, "/api/recipes/abc", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to delete recipe");
}

#[tokio::test]
async fn test_collection_without_supabase_is_a_configuration_error() {
    let harness = Harness::new(generator_returning(recipe_json("Eggs")), false);

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(recipe_json("Eggs")),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server configuration error");
    assert_eq!(body["details"], "Missing Supabase environment variables");
}

#[tokio::test]
async fn test_auth_endpoints() {
    let harness = Harness::with_store();

    let (status, body) = harness
        .send(Method::GET, "/api/auth/me", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "alice", "email": "alice@example.com"}));

    let (status, _) = harness.send(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = harness
        .send(Method::POST, "/api/auth/sign-out", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_sign_in_redirects_to_provider() {
    let harness = Harness::with_store();
    let request = Request::builder()
        .uri("/api/auth/sign-in?provider=github")
        .body(Body::empty())
        .unwrap();

    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("provider=github"));
    assert!(location.contains("redirect_to=http://localhost:3000"));
}

#[tokio::test]
async fn test_diagnostics_always_answer_ok() {
    let harness = Harness::new(generator_returning(recipe_json("Eggs")), false);

    for path in [
        "/api/test-gemini",
        "/api/test-n8n",
        "/api/test-supabase",
        "/api/test-database",
    ] {
        let (status, body) = harness.send(Method::GET, path, None, None).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body["connected"], false, "{path}");
        assert!(body["error"].is_string(), "{path}");
        assert!(body["timestamp"].is_string(), "{path}");
    }
}

#[tokio::test]
async fn test_database_diagnostic_counts_recipes() {
    let harness = Harness::with_store();
    harness
        .send(
            Method::POST,
            "/api/save-recipe",
            Some(ALICE_TOKEN),
            Some(recipe_json("Fried Eggs")),
        )
        .await;

    let (status, body) = harness
        .send(Method::GET, "/api/test-database", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["tableExists"], true);
    assert_eq!(body["recipeCount"], 1);
    assert_eq!(body["userSignedIn"], true);
    assert_eq!(body["userId"], "alice");

    let (_, body) = harness
        .send(Method::GET, "/api/test-supabase", None, None)
        .await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["userSignedIn"], false);
}

#[tokio::test]
async fn test_database_diagnostic_reports_missing_table() {
    let harness = Harness::with_store();
    harness
        .store
        .fail_with(ProviderError::new("relation does not exist").with_status(404));

    let (status, body) = harness
        .send(Method::GET, "/api/test-database", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["tableExists"], false);
}

#[test]
fn test_openapi_lists_every_route() {
    let spec = super::openapi();
    for path in [
        "/api/generate-recipe",
        "/api/save-recipe",
        "/api/recipes",
        "/api/recipes/{id}",
        "/api/auth/sign-in",
        "/api/auth/sign-out",
        "/api/auth/me",
        "/api/test-gemini",
        "/api/test-n8n",
        "/api/test-supabase",
        "/api/test-database",
    ] {
        assert!(spec.paths.paths.contains_key(path), "missing {path}");
    }
}

#[test]
fn test_openapi_documents_me_response_schema() {
    let spec = super::openapi();
    let schemas = &spec.components.as_ref().unwrap().schemas;
    assert!(schemas.contains_key("MeResponse"));
    assert!(!schemas.contains_key("Identity"));
}
