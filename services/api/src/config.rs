use agapai_core::ChoicePolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported narrative backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Cohere,
    OpenAI,
    Gemini,
}

impl Provider {
    /// The chat model used when `CHAT_MODEL` is not set.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Cohere => "command-r-plus",
            Provider::OpenAI => "gpt-4o",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub cohere_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub fireworks_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub choice_policy: ChoicePolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("STORY_PROVIDER").unwrap_or_else(|_| "cohere".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "cohere" => Provider::Cohere,
            "openai" => Provider::OpenAI,
            "gemini" => Provider::Gemini,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORY_PROVIDER".to_string(),
                    format!("'{}' is not one of cohere, openai, gemini", other),
                ));
            }
        };

        let cohere_api_key = non_empty_var("COHERE_API_KEY");
        let openai_api_key = non_empty_var("OPENAI_API_KEY");
        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        let fireworks_api_key = non_empty_var("FIREWORKS_API_KEY");

        let chat_model =
            non_empty_var("CHAT_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        let enforce_str =
            std::env::var("ENFORCE_CHOICE_COUNT").unwrap_or_else(|_| "false".to_string());
        let choice_policy = match enforce_str.to_lowercase().as_str() {
            "true" | "1" => ChoicePolicy::Enforce,
            "false" | "0" => ChoicePolicy::Trust,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "ENFORCE_CHOICE_COUNT".to_string(),
                    format!("'{}' is not a boolean", enforce_str),
                ));
            }
        };

        let (key, key_var) = match provider {
            Provider::Cohere => (&cohere_api_key, "COHERE_API_KEY"),
            Provider::OpenAI => (&openai_api_key, "OPENAI_API_KEY"),
            Provider::Gemini => (&gemini_api_key, "GEMINI_API_KEY"),
        };
        if key.is_none() {
            return Err(ConfigError::MissingVar(format!(
                "{} must be set for '{}' provider",
                key_var,
                provider_str.to_lowercase()
            )));
        }

        Ok(Self {
            bind_address,
            provider,
            cohere_api_key,
            openai_api_key,
            gemini_api_key,
            fireworks_api_key,
            chat_model,
            log_level,
            prompts_path,
            choice_policy,
        })
    }

    /// The API key of the selected provider.
    pub fn provider_api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Cohere => self.cohere_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
