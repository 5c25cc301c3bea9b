//! Vector-similarity ranking against the document embedding store

use super::{RetrievalStrategy, StrategyFailure, StrategyHit, StrategyKind, StrategyResult};
use crate::config::SemanticConfig;
use crate::embedding::{EmbeddingProvider, VectorStore};
use crate::error::{CivicError, Result};
use crate::query::NormalizedQuery;
use std::sync::Arc;

/// Semantic strategy
///
/// The embedder is an injected handle. Without one, or without any stored
/// embeddings, the strategy reports `EmbeddingUnavailable` and fusion carries on
/// with the remaining strategies.
pub struct SemanticStrategy {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Arc<dyn VectorStore>,
    min_similarity: f64,
}

impl SemanticStrategy {
    /// # Errors
    /// A configuration error when the embedder's dimension differs from the
    /// store's; this is never deferred to query time.
    pub fn new(
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        store: Arc<dyn VectorStore>,
        config: &SemanticConfig,
    ) -> Result<Self> {
        if let Some(provider) = &embedder {
            if provider.dimension() != store.dimension() {
                return Err(CivicError::Config(format!(
                    "Embedding model {} produces {}D vectors but the corpus store holds {}D vectors",
                    provider.model_name(),
                    provider.dimension(),
                    store.dimension()
                )));
            }
        }

        Ok(Self {
            embedder,
            store,
            min_similarity: config.min_similarity,
        })
    }
}

impl RetrievalStrategy for SemanticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Semantic
    }

    fn retrieve(
        &self,
        query: &NormalizedQuery,
        limit: usize,
    ) -> std::result::Result<StrategyResult, StrategyFailure> {
        if self.store.is_empty() {
            return Err(StrategyFailure::EmbeddingUnavailable(
                "no document embeddings in corpus".to_string(),
            ));
        }

        let embedder = self.embedder.as_ref().ok_or_else(|| {
            StrategyFailure::EmbeddingUnavailable("no embedding backend configured".to_string())
        })?;

        let vector = embedder
            .embed(query.effective_text())
            .map_err(|e| StrategyFailure::EmbeddingUnavailable(e.to_string()))?;

        let similar = self
            .store
            .similarity_search(&vector, limit)
            .map_err(|e| StrategyFailure::EmbeddingUnavailable(e.to_string()))?;

        let hits: Vec<StrategyHit> = similar
            .into_iter()
            .filter(|(_, similarity)| *similarity >= self.min_similarity)
            .map(|(id, similarity)| StrategyHit::new(id, similarity))
            .collect();

        tracing::debug!(
            "Semantic strategy matched {} documents above {:.2}",
            hits.len(),
            self.min_similarity
        );

        Ok(StrategyResult::new(StrategyKind::Semantic, hits))
    }
}
