//! Answer generators: the external service and the metadata heuristic

use super::context::build_prompt;
use super::heuristic;
use super::providers::{CompletionClient, CompletionRequest, GenerationError};
use super::{SynthesisInput, SynthesisMode};
use crate::config::LlmConfig;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Produces the answer text for a synthesis input
pub trait ResponseGenerator: Send + Sync {
    fn mode(&self) -> SynthesisMode;

    /// Generate within `budget`, the time left before the query deadline
    fn generate<'a>(&'a self, input: &'a SynthesisInput<'a>, budget: Duration) -> GenerationFuture<'a>;
}

/// Generator backed by an external completion service
pub struct ServiceGenerator {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ServiceGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl ResponseGenerator for ServiceGenerator {
    fn mode(&self) -> SynthesisMode {
        SynthesisMode::Synthesized
    }

    fn generate<'a>(&'a self, input: &'a SynthesisInput<'a>, budget: Duration) -> GenerationFuture<'a> {
        Box::pin(async move {
            let request = CompletionRequest {
                prompt: build_prompt(input),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let limit = self.timeout.min(budget);
            tracing::debug!(
                "Calling {} with {} context documents ({}ms budget)",
                self.client.name(),
                input.documents.len(),
                limit.as_millis()
            );

            // Dropping the future on expiry cancels the in-flight request
            match tokio::time::timeout(limit, self.client.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout),
            }
        })
    }
}

/// Generator that never calls out: the deterministic metadata answer
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicGenerator;

impl ResponseGenerator for HeuristicGenerator {
    fn mode(&self) -> SynthesisMode {
        SynthesisMode::Fallback
    }

    fn generate<'a>(&'a self, input: &'a SynthesisInput<'a>, _budget: Duration) -> GenerationFuture<'a> {
        Box::pin(async move { Ok(heuristic::compose(input)) })
    }
}
