//! Main Entrypoint for the AgapAI API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading prompt template overrides.
//! 3. Building the narrative and image backends and the story orchestrator.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use agapai_api::{
    config::{Config, Provider},
    router::create_router,
    state::AppState,
};
use agapai_core::{
    ConversationOrchestrator, NarrativeModel, RequestComposer,
    cohere::CohereModel,
    image::{FireworksImageModel, ImageModel},
    llm_client::OpenAICompatibleModel,
    prompt::PromptTemplates,
};
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompt overrides from a directory.
///
/// A missing directory is not an error; the built-in templates are used instead.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    if !prompts_path.is_dir() {
        info!(path = %prompts_path.display(), "No prompts directory; using built-in templates.");
        return Ok(prompts);
    }
    for entry in fs::read_dir(prompts_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt {}", path.display()))?;
            prompts.insert(prompt_key, content);
        }
    }
    info!(count = prompts.len(), "Loaded prompt overrides.");
    Ok(prompts)
}

fn openai_compatible(api_key: &str, api_base: &str, model: &str) -> Arc<dyn NarrativeModel> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base);
    Arc::new(OpenAICompatibleModel::new(openai_config, model.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let prompts = load_prompts(&config.prompts_path)?;
    let composer = RequestComposer::new(PromptTemplates::from_map(&prompts));

    let api_key = config
        .provider_api_key()
        .context("API key for the selected provider is missing")?;
    let narrative_model: Arc<dyn NarrativeModel> = match &config.provider {
        Provider::Cohere => {
            info!("Using Cohere provider.");
            Arc::new(
                CohereModel::new(api_key, config.chat_model.clone())
                    .context("Failed to build Cohere client")?,
            )
        }
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            openai_compatible(api_key, "https://api.openai.com/v1", &config.chat_model)
        }
        Provider::Gemini => {
            info!("Using Gemini provider.");
            openai_compatible(
                api_key,
                "https://generativelanguage.googleapis.com/v1beta/openai",
                &config.chat_model,
            )
        }
    };

    let image_model: Option<Arc<dyn ImageModel>> = match &config.fireworks_api_key {
        Some(key) => Some(Arc::new(
            FireworksImageModel::new(key.clone()).context("Failed to build image client")?,
        )),
        None => {
            warn!("FIREWORKS_API_KEY not set; /generate-image will be unavailable.");
            None
        }
    };

    let orchestrator = ConversationOrchestrator::new(narrative_model, composer)
        .with_choice_policy(config.choice_policy);

    let app_state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        image_model,
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        choice_policy = ?config.choice_policy,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
