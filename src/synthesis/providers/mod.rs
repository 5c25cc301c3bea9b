//! Generative-service clients
//!
//! Each client turns one prompt into one completion. Retries are not done
//! here; a failed call falls straight back to the heuristic answer.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use super::FallbackReason;
use crate::config::LlmConfig;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why the generative call produced no usable text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation disabled")]
    Disabled,

    #[error("generation timed out")]
    Timeout,

    #[error("service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("API key not set in ${0}")]
    MissingApiKey(String),
}

impl GenerationError {
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            GenerationError::Disabled | GenerationError::MissingApiKey(_) => FallbackReason::Disabled,
            GenerationError::Timeout => FallbackReason::Timeout,
            GenerationError::Http { .. }
            | GenerationError::Transport(_)
            | GenerationError::Malformed(_) => FallbackReason::ServiceError,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else if e.is_decode() {
            GenerationError::Malformed(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Request envelope shared by the clients
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A text-generation backend
pub trait CompletionClient: Send + Sync {
    fn name(&self) -> &str;

    fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_>;
}

/// Build the configured client
///
/// # Errors
/// `Disabled` when generation is switched off or the provider is unknown,
/// `MissingApiKey` when the key variable is unset or empty.
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, GenerationError> {
    if !config.enabled {
        return Err(GenerationError::Disabled);
    }

    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;

    let timeout = Duration::from_millis(config.timeout_ms);

    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::new(
            api_key,
            config.model.clone(),
            config.api_base.clone(),
            timeout,
        )?)),
        "openai" => Ok(Arc::new(OpenAiClient::new(
            api_key,
            config.model.clone(),
            config.api_base.clone(),
            timeout,
        )?)),
        other => {
            tracing::warn!("Unknown LLM provider '{}', generation disabled", other);
            Err(GenerationError::Disabled)
        }
    }
}
