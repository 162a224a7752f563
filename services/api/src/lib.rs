//! AgapAI API Library Crate
//!
//! This library contains the web-facing side of the story service: configuration,
//! application state, request/response models, handlers and routing. The `api`
//! binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
