//! Story Illustration Service
//!
//! A single-shot mapping from a scene description to a base64-encoded image.
//! It has no relationship to conversation state.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const FIREWORKS_SD3_URL: &str = "https://api.fireworks.ai/inference/v1/images/sd3";
pub const SD3_MODEL: &str = "models/stable-diffusion-3";

/// Failures of an image backend.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Image backend rejected the request: {0}")]
    Rejected(String),
    #[error("Failed to parse image response: {0}")]
    Parse(String),
    #[error("Image response contained no images")]
    NoImage,
    #[error("Image payload is not valid base64")]
    InvalidPayload,
}

/// Defines the contract for any service that can illustrate a story scene.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generates an image for `prompt` and returns it base64-encoded.
    async fn generate(&self, prompt: &str) -> Result<String, ImageError>;
}

/// Wraps a scene description in the house illustration style.
pub fn style_prompt(prompt: &str) -> String {
    format!(
        "A digital illustration for a financial planning app, depicting: {prompt}. The style is hopeful, clean, and modern, with a Filipino setting."
    )
}

#[derive(Debug, Serialize)]
struct Sd3Body<'a> {
    model: &'a str,
    prompt: String,
    height: u32,
    width: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct Sd3Response {
    #[serde(default)]
    images: Vec<String>,
}

fn sd3_body(prompt: &str) -> Sd3Body<'static> {
    Sd3Body {
        model: SD3_MODEL,
        prompt: style_prompt(prompt),
        height: 512,
        width: 512,
        // Fewer steps keep generation fast.
        steps: 25,
    }
}

/// Takes the first image from a response and checks that it is base64.
fn first_image(response: Sd3Response) -> Result<String, ImageError> {
    let image = response.images.into_iter().next().ok_or(ImageError::NoImage)?;
    STANDARD
        .decode(image.as_bytes())
        .map_err(|_| ImageError::InvalidPayload)?;
    Ok(image)
}

/// An `ImageModel` backed by Fireworks' Stable Diffusion 3 endpoint.
pub struct FireworksImageModel {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl FireworksImageModel {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ImageError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: FIREWORKS_SD3_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ImageModel for FireworksImageModel {
    async fn generate(&self, prompt: &str) -> Result<String, ImageError> {
        debug!(prompt_len = prompt.len(), "Requesting story illustration");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&sd3_body(prompt))
            .send()
            .await
            .map_err(|e| ImageError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Rejected(format!("status {}: {}", status.as_u16(), body)));
        }

        let parsed: Sd3Response = response
            .json()
            .await
            .map_err(|e| ImageError::Parse(e.to_string()))?;
        first_image(parsed)
    }
}
