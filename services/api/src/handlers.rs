//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling story and illustration requests.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use agapai_core::{Identity, OrchestrationError, Turn};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{ErrorResponse, ImageRequest, ImageResponse, StoryRequest, StoryResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    BadGateway(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::BadGateway(message) => {
                (StatusCode::BAD_GATEWAY, Json(ErrorResponse { message })).into_response()
            }
            ApiError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

/// Upstream details stay in the log; the client only learns that the turn failed.
fn story_backend_error(err: OrchestrationError) -> ApiError {
    error!(error = %err, "Story turn failed");
    ApiError::BadGateway("Story generation failed".to_string())
}

/// Continue the story (or summarize it) for the reader's latest choice.
#[utoipa::path(
    post,
    path = "/generate-story",
    request_body = StoryRequest,
    responses(
        (status = 200, description = "Next story segment and choices", body = StoryResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Story backend failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(turn_id = %Uuid::new_v4()))]
pub async fn generate_story(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StoryRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    if payload.user_input.trim().is_empty() {
        return Err(ApiError::BadRequest("user_input must not be empty".to_string()));
    }

    let history: Vec<Turn> = payload.chat_history.into_iter().map(Turn::from).collect();
    let identity: Option<Identity> = payload.user_info.map(Identity::from);
    info!(
        history_len = history.len(),
        personalized = identity.is_some(),
        "Generating story turn"
    );

    let output = state
        .orchestrator
        .run_turn(&history, &payload.user_input, identity.as_ref())
        .await
        .map_err(story_backend_error)?;

    Ok(Json(output.into()))
}

/// Illustrate a story scene.
#[utoipa::path(
    post,
    path = "/generate-image",
    request_body = ImageRequest,
    responses(
        (status = 200, description = "Base64-encoded illustration", body = ImageResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Image backend failed", body = ErrorResponse),
        (status = 503, description = "Image generation is not configured", body = ErrorResponse)
    )
)]
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let image_model = state.image_model.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Image generation is not configured".to_string())
    })?;

    let image_base64 = image_model.generate(&payload.prompt).await.map_err(|e| {
        error!(error = %e, "Image generation failed");
        ApiError::BadGateway("Image generation failed".to_string())
    })?;

    Ok(Json(ImageResponse { image_base64 }))
}
