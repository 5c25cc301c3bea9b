//! Response synthesis
//!
//! Turns the top fused documents into a short plain-language answer. The
//! generator is chosen once, at construction: an external completion service
//! when one is configured and reachable, the metadata heuristic otherwise. A
//! failed or late service call falls back to the heuristic for that query, so
//! the caller always gets an answer.

pub mod context;
mod confidence;
mod generator;
pub mod heuristic;
pub mod providers;
mod suggestions;

pub use confidence::answer_confidence;
pub use generator::{GenerationFuture, HeuristicGenerator, ResponseGenerator, ServiceGenerator};
pub use providers::{
    client_from_config, AnthropicClient, CompletionClient, CompletionFuture, CompletionRequest,
    GenerationError, OpenAiClient,
};
pub use suggestions::derive_suggestions;

use crate::config::{LlmConfig, SynthesisConfig};
use crate::corpus::Document;
use crate::query::NormalizedQuery;
use crate::retrieval::FusedRanking;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

/// How the answer text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    Synthesized,
    Fallback,
}

/// Why the heuristic answer was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Disabled,
    Timeout,
    ServiceError,
    EmptyResponse,
    NoDocuments,
}

/// Coarse confidence label: high >= 0.8, medium >= 0.6, low > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    None,
}

/// Everything a generator sees
#[derive(Debug)]
pub struct SynthesisInput<'a> {
    pub query: &'a NormalizedQuery,
    /// Context documents in fused order
    pub documents: Vec<&'a Document>,
    /// Fused matches before paging
    pub total_matches: usize,
    pub summary_chars: usize,
    /// Too few matches to call the answer complete
    pub incomplete: bool,
}

/// Synthesizer output, folded into the search response
#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    pub text: String,
    pub confidence: f64,
    pub band: ConfidenceBand,
    pub mode: SynthesisMode,
    pub fallback_reason: Option<FallbackReason>,
    pub source_documents: Vec<String>,
    pub suggestions: Vec<String>,
}

pub struct ResponseSynthesizer {
    generator: Arc<dyn ResponseGenerator>,
    config: SynthesisConfig,
}

impl ResponseSynthesizer {
    pub fn new(generator: Arc<dyn ResponseGenerator>, config: SynthesisConfig) -> Self {
        Self { generator, config }
    }

    /// Pick the generator from configuration
    ///
    /// A disabled service, a missing API key or an unknown provider all
    /// select the heuristic generator.
    pub fn from_config(synthesis: &SynthesisConfig, llm: &LlmConfig) -> Self {
        match client_from_config(llm) {
            Ok(client) => {
                tracing::info!("Answers generated by {} ({})", client.name(), llm.model);
                Self::with_client(client, synthesis, llm)
            }
            Err(GenerationError::Disabled) => {
                tracing::info!("Generation disabled, answers use document metadata");
                Self::heuristic(synthesis)
            }
            Err(e) => {
                tracing::warn!("Generation unavailable ({}), answers use document metadata", e);
                Self::heuristic(synthesis)
            }
        }
    }

    pub fn with_client(client: Arc<dyn CompletionClient>, synthesis: &SynthesisConfig, llm: &LlmConfig) -> Self {
        Self::new(Arc::new(ServiceGenerator::new(client, llm)), synthesis.clone())
    }

    pub fn heuristic(synthesis: &SynthesisConfig) -> Self {
        Self::new(Arc::new(HeuristicGenerator), synthesis.clone())
    }

    pub fn mode(&self) -> SynthesisMode {
        self.generator.mode()
    }

    /// Answer for the top documents of a fused ranking
    ///
    /// # Arguments
    /// * `query` - The normalized query
    /// * `documents` - Fused documents in rank order; only the first
    ///   `context_documents` are used
    /// * `ranking` - The fusion output the documents came from
    /// * `deadline` - Query deadline; the service call never outlives it
    pub async fn synthesize(
        &self,
        query: &NormalizedQuery,
        documents: &[&Document],
        ranking: &FusedRanking,
        deadline: Instant,
    ) -> SynthesizedAnswer {
        if ranking.is_empty() || documents.is_empty() {
            return self.no_results(query);
        }

        let total_matches = ranking.total_candidates.max(documents.len());
        let input = SynthesisInput {
            query,
            documents: documents
                .iter()
                .take(self.config.context_documents.max(1))
                .copied()
                .collect(),
            total_matches,
            summary_chars: self.config.summary_chars,
            incomplete: total_matches < self.config.min_match_count,
        };

        let budget = deadline.saturating_duration_since(Instant::now());
        let (text, mode, fallback_reason) = match self.generator.generate(&input, budget).await {
            Ok(text) if !text.trim().is_empty() => {
                let mode = self.generator.mode();
                let reason = (mode == SynthesisMode::Fallback).then_some(FallbackReason::Disabled);
                (text.trim().to_string(), mode, reason)
            }
            Ok(_) => {
                tracing::warn!("Generation returned no text, using metadata answer");
                (
                    heuristic::compose(&input),
                    SynthesisMode::Fallback,
                    Some(FallbackReason::EmptyResponse),
                )
            }
            Err(e) => {
                tracing::warn!("Generation failed ({}), using metadata answer", e);
                (
                    heuristic::compose(&input),
                    SynthesisMode::Fallback,
                    Some(e.fallback_reason()),
                )
            }
        };

        let confidence = answer_confidence(ranking.confidence, total_matches, mode, &self.config);
        let source_documents = cited_sources(&text, &input.documents);

        let mut suggestions = derive_suggestions(&input.documents, query, self.config.max_suggestions);
        if suggestions.is_empty() {
            suggestions = self.default_suggestions();
        }

        SynthesizedAnswer {
            text,
            confidence,
            band: ConfidenceBand::from_score(confidence),
            mode,
            fallback_reason,
            source_documents,
            suggestions,
        }
    }

    fn no_results(&self, query: &NormalizedQuery) -> SynthesizedAnswer {
        SynthesizedAnswer {
            text: heuristic::no_results_text(&query.raw),
            confidence: 0.0,
            band: ConfidenceBand::None,
            mode: SynthesisMode::Fallback,
            fallback_reason: Some(FallbackReason::NoDocuments),
            source_documents: Vec::new(),
            suggestions: self.default_suggestions(),
        }
    }

    fn default_suggestions(&self) -> Vec<String> {
        self.config
            .default_suggestions
            .iter()
            .take(self.config.max_suggestions)
            .cloned()
            .collect()
    }
}

/// Context documents the text cites, or all of them when it cites none
fn cited_sources(text: &str, documents: &[&Document]) -> Vec<String> {
    let cited: Vec<String> = documents
        .iter()
        .filter(|d| text.contains(d.identifier.as_str()))
        .map(|d| d.identifier.clone())
        .collect();

    if cited.is_empty() {
        documents.iter().map(|d| d.identifier.clone()).collect()
    } else {
        cited
    }
}
