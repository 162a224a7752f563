//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the story
//! orchestrator and the optional illustration backend.

use agapai_core::{ConversationOrchestrator, image::ImageModel};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    /// `None` when no image backend is configured.
    pub image_model: Option<Arc<dyn ImageModel>>,
}
