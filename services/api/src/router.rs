//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the story API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ChatMessage, ErrorResponse, ImageRequest, ImageResponse, MessageRole, StoryRequest,
        StoryResponse, UserInfo,
    },
    state::AppState,
};

use axum::{Router, routing::post};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generate_story,
        handlers::generate_image,
    ),
    components(
        schemas(StoryRequest, StoryResponse, ChatMessage, MessageRole, UserInfo, ImageRequest, ImageResponse, ErrorResponse)
    ),
    tags(
        (name = "AgapAI API", description = "Interactive financial stories for Filipino entrepreneurs")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/generate-story", post(handlers::generate_story))
        .route("/generate-image", post(handlers::generate_image))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agapai_core::{
        BackendError, ConversationOrchestrator, ModelRequest, NarrativeModel, RequestComposer,
        image::{ImageError, ImageModel},
        orchestrator::{FALLBACK_CHOICE, FALLBACK_NARRATIVE},
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Replies with a fixed text and records the last request it saw.
    struct ScriptedModel {
        reply: Result<String, String>,
        last_request: Mutex<Option<ModelRequest>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                last_request: Mutex::new(None),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl NarrativeModel for ScriptedModel {
        async fn generate(&self, request: ModelRequest) -> Result<String, BackendError> {
            *self.last_request.lock().unwrap() = Some(request);
            self.reply.clone().map_err(BackendError::Rejected)
        }
    }

    struct FixedImage(Result<String, ()>);

    #[async_trait]
    impl ImageModel for FixedImage {
        async fn generate(&self, _prompt: &str) -> Result<String, ImageError> {
            self.0.clone().map_err(|_| ImageError::NoImage)
        }
    }

    fn app(model: Arc<ScriptedModel>, image_model: Option<Arc<dyn ImageModel>>) -> Router {
        let orchestrator = ConversationOrchestrator::new(model, RequestComposer::default());
        create_router(Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
            image_model,
        }))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_generate_story_returns_structured_output() {
        let model = ScriptedModel::replying(
            "Here you go:\n{\"narrative\":\"Your stall opens.\",\"choices\":[\"Hire\",\"Wait\"]}",
        );
        let (status, json) = post_json(
            app(model.clone(), None),
            "/generate-story",
            json!({
                "chat_history": [{"role": "USER", "message": "Start"}],
                "user_input": "Open a stall",
                "user_info": {"uid": "u-1", "firstName": "Ana", "lastName": "Reyes", "email": "ana@example.com"}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["narrative"], "Your stall opens.");
        assert_eq!(json["choices"], json!(["Hire", "Wait"]));

        let request = model.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.history.len(), 1);
        assert!(request.instruction_text.contains("Ana"));
    }

    #[tokio::test]
    async fn test_generate_story_malformed_output_uses_fallback() {
        let model = ScriptedModel::replying("I cannot comply.");
        let (status, json) = post_json(
            app(model, None),
            "/generate-story",
            json!({"chat_history": [], "user_input": "Open a stall"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["narrative"], FALLBACK_NARRATIVE);
        assert_eq!(json["choices"], json!([FALLBACK_CHOICE]));
    }

    #[tokio::test]
    async fn test_generate_story_backend_failure_is_bad_gateway() {
        let model = ScriptedModel::failing("rate limited");
        let (status, json) = post_json(
            app(model, None),
            "/generate-story",
            json!({"chat_history": [], "user_input": "Open a stall"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["message"], "Story generation failed");
        assert!(!json.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_generate_story_blank_input_is_bad_request() {
        let model = ScriptedModel::replying("{}");
        let (status, _) = post_json(
            app(model.clone(), None),
            "/generate-story",
            json!({"chat_history": [], "user_input": "   "}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(model.last_request.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_story_finish_sends_summary_request() {
        let model = ScriptedModel::replying(r#"{"narrative":"In the end...","choices":[]}"#);
        let (status, json) = post_json(
            app(model.clone(), None),
            "/generate-story",
            json!({"chat_history": [{"role": "user", "message": "Start"}], "user_input": "Finish my story"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["choices"], json!([]));
        let request = model.last_request.lock().unwrap().clone().unwrap();
        assert!(!request.message.contains("Finish my story"));
    }

    #[tokio::test]
    async fn test_generate_image_returns_payload() {
        let image: Arc<dyn ImageModel> = Arc::new(FixedImage(Ok("aGVsbG8=".to_string())));
        let (status, json) = post_json(
            app(ScriptedModel::replying("{}"), Some(image)),
            "/generate-image",
            json!({"prompt": "a sari-sari store"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["imageUrl_base64"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_generate_image_failure_is_bad_gateway() {
        let image: Arc<dyn ImageModel> = Arc::new(FixedImage(Err(())));
        let (status, json) = post_json(
            app(ScriptedModel::replying("{}"), Some(image)),
            "/generate-image",
            json!({"prompt": "a sari-sari store"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["message"], "Image generation failed");
        assert!(!json.to_string().contains("no images"));
    }

    #[tokio::test]
    async fn test_generate_image_unconfigured_is_unavailable() {
        let (status, json) = post_json(
            app(ScriptedModel::replying("{}"), None),
            "/generate-image",
            json!({"prompt": "a sari-sari store"}),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["message"], "Image generation is not configured");
    }

    #[test]
    fn test_openapi_lists_story_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/generate-story"));
        assert!(doc.paths.paths.contains_key("/generate-image"));
    }
}
