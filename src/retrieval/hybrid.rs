//! Hybrid search: normalize, run the strategies concurrently, fuse, synthesize

use super::{
    DegradedStrategy, DocumentView, KeywordStrategy, MetadataStrategy, RankFusion,
    RetrievalStrategy, SearchRequest, SearchResponse, SemanticStrategy, StrategyFailure,
    StrategyOutcome,
};
use crate::config::{Config, SearchConfig};
use crate::corpus::{Corpus, Document};
use crate::embedding::{EmbeddingProvider, TextIndex, VectorStore};
use crate::error::{CivicError, Result};
use crate::query::{NormalizedQuery, QueryNormalizer};
use crate::synthesis::ResponseSynthesizer;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Hybrid searcher over one read-only corpus snapshot
///
/// Holds no mutable state; concurrent searches share it behind an `Arc`.
pub struct HybridSearcher {
    normalizer: QueryNormalizer,
    strategies: Vec<Arc<dyn RetrievalStrategy>>,
    fusion: RankFusion,
    synthesizer: ResponseSynthesizer,
    corpus: Arc<Corpus>,
    config: SearchConfig,
    context_documents: usize,
}

impl HybridSearcher {
    /// Wire the three standard strategies to their collaborators
    ///
    /// # Errors
    /// Configuration errors (bad identifier rule, embedder/store dimension
    /// mismatch) surface here, never at query time.
    pub fn new(
        config: &Config,
        corpus: Arc<Corpus>,
        text_index: Arc<dyn TextIndex>,
        store: Arc<dyn VectorStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        synthesizer: ResponseSynthesizer,
    ) -> Result<Self> {
        let strategies: Vec<Arc<dyn RetrievalStrategy>> = vec![
            Arc::new(KeywordStrategy::new(text_index, Arc::clone(&corpus), &config.keyword)),
            Arc::new(SemanticStrategy::new(embedder, store, &config.semantic)?),
            Arc::new(MetadataStrategy::new(Arc::clone(&corpus))),
        ];
        Self::with_strategies(config, corpus, strategies, synthesizer)
    }

    /// Build with an explicit strategy set
    pub fn with_strategies(
        config: &Config,
        corpus: Arc<Corpus>,
        strategies: Vec<Arc<dyn RetrievalStrategy>>,
        synthesizer: ResponseSynthesizer,
    ) -> Result<Self> {
        Ok(Self {
            normalizer: QueryNormalizer::new(&config.query)?,
            strategies,
            fusion: RankFusion::new(&config.fusion),
            synthesizer,
            corpus,
            config: config.search.clone(),
            context_documents: config.synthesis.context_documents.max(1),
        })
    }

    pub fn normalizer(&self) -> &QueryNormalizer {
        &self.normalizer
    }

    /// Run one search request end to end
    ///
    /// # Errors
    /// `InvalidQuery` before any strategy runs, or `AllStrategiesUnavailable`
    /// when not a single strategy produced a list. Everything else degrades
    /// into a lower-confidence answer.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let query = self.normalizer.normalize(&request.query).map_err(|rejection| {
            tracing::info!("[{}] Rejected query: {}", request_id, rejection);
            CivicError::from(rejection)
        })?;

        let limit = request
            .limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1));
        let offset = request.offset.unwrap_or(0).min(self.config.max_offset);
        let window = offset.saturating_add(limit);
        // No strategy can return more documents than the corpus holds
        let per_strategy = window
            .saturating_mul(self.config.search_multiplier.max(1))
            .min(self.corpus.len());

        tracing::info!(
            "[{}] Searching '{}' (canonical '{}', limit {}, offset {})",
            request_id,
            query.raw,
            query.canonical,
            limit,
            offset
        );

        let query_deadline = started + Duration::from_millis(self.config.query_deadline_ms);
        let mut outcomes = self.run_strategies(&query, per_strategy).await;

        let filters = request.filters.as_ref().filter(|f| !f.is_empty());
        for outcome in outcomes.iter_mut().filter(|o| o.is_live()) {
            outcome.result.retain(|id| match self.corpus.get(id) {
                Some(document) => filters.map_or(true, |f| f.matches(document)),
                None => false,
            });
        }

        let degraded: Vec<DegradedStrategy> = outcomes
            .iter()
            .filter_map(|o| o.failure.as_ref().map(|f| DegradedStrategy::new(o.kind, f)))
            .collect();
        for strategy in &degraded {
            tracing::warn!(
                "[{}] {} strategy degraded: {}",
                request_id,
                strategy.strategy,
                strategy.reason
            );
        }

        if !outcomes.iter().any(StrategyOutcome::is_live) {
            tracing::warn!("[{}] Every retrieval strategy failed", request_id);
            return Err(CivicError::AllStrategiesUnavailable {
                failures: outcomes
                    .into_iter()
                    .filter_map(|o| o.failure.map(|f| (o.kind, f)))
                    .collect(),
            });
        }

        let ranking = self.fusion.fuse(
            &outcomes,
            window.max(self.context_documents),
            |id| self.corpus.last_action(id),
        );

        let documents: Vec<DocumentView> = ranking
            .results
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|fused| {
                self.corpus
                    .get(&fused.document_id)
                    .map(|document| DocumentView::new(document, fused))
            })
            .collect();

        let context: Vec<&Document> = ranking
            .results
            .iter()
            .take(self.context_documents)
            .filter_map(|fused| self.corpus.get(&fused.document_id))
            .collect();

        let answer = self
            .synthesizer
            .synthesize(&query, &context, &ranking, query_deadline)
            .await;

        let response_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "[{}] {} results, confidence {:.2} ({:?}), {}ms",
            request_id,
            ranking.total_candidates,
            answer.confidence,
            answer.mode,
            response_time_ms
        );

        Ok(SearchResponse {
            request_id,
            query: query.raw.clone(),
            processed_query: query.canonical.clone(),
            returned_results: documents.len(),
            documents,
            total_results: ranking.total_candidates,
            search_type: "hybrid".to_string(),
            ai_summary: answer.text,
            confidence_score: answer.confidence,
            confidence_band: answer.band,
            synthesis_mode: answer.mode,
            fallback_reason: answer.fallback_reason,
            source_documents: answer.source_documents,
            suggestions: answer.suggestions,
            response_time_ms,
            degraded_strategies: degraded,
        })
    }

    /// Run every strategy on the blocking pool under one shared deadline
    async fn run_strategies(&self, query: &NormalizedQuery, limit: usize) -> Vec<StrategyOutcome> {
        let deadline = Instant::now() + Duration::from_millis(self.config.strategy_timeout_ms);
        let shared = Arc::new(query.clone());

        let handles: Vec<_> = self
            .strategies
            .iter()
            .map(|strategy| {
                let strategy = Arc::clone(strategy);
                let query = Arc::clone(&shared);
                let kind = strategy.kind();
                (kind, tokio::task::spawn_blocking(move || strategy.retrieve(&query, limit)))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let outcome = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(Ok(result))) => {
                    tracing::debug!("{} strategy returned {} hits", kind, result.len());
                    StrategyOutcome::live(result)
                }
                Ok(Ok(Err(failure))) => StrategyOutcome::failed(kind, failure),
                Ok(Err(join_error)) => {
                    StrategyOutcome::failed(kind, StrategyFailure::Aborted(join_error.to_string()))
                }
                // The blocking task keeps running detached; its result is discarded
                Err(_) => StrategyOutcome::failed(kind, StrategyFailure::TimedOut),
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}
