/// Read-only store of current document embeddings
use super::vector_index::{CandidateIndex, VectorIndexError};
use super::cosine_similarity;
use crate::config::SemanticConfig;
use crate::corpus::Embedding;
use crate::error::{CivicError, Result};
use ahash::AHashMap;

/// Vector lookup consumed by the semantic strategy
pub trait VectorStore: Send + Sync {
    /// Up to `limit` (document_id, cosine similarity) pairs, most similar first
    fn similarity_search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> std::result::Result<Vec<(String, f64)>, VectorIndexError>;

    /// Current embedding of a document, if it has one
    fn get_embedding(&self, document_id: &str) -> Option<&[f32]>;

    /// Dimensionality shared by every stored vector
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory embedding store with exact cosine scoring
///
/// Small stores are scanned in full. Past `exact_scan_limit` vectors an HNSW
/// index narrows the scan to `candidate_pool` candidates first.
pub struct EmbeddingStore {
    dimension: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    by_id: AHashMap<String, usize>,
    candidates: Option<CandidateIndex>,
    candidate_pool: usize,
    ef_search: usize,
}

impl EmbeddingStore {
    /// Build the store from one current embedding per document
    ///
    /// # Errors
    /// `DimensionMismatch` if any vector differs from `dimension`; a mixed
    /// corpus is a configuration error, never a per-query one.
    pub fn new(dimension: usize, embeddings: Vec<Embedding>, config: &SemanticConfig) -> Result<Self> {
        let mut ids = Vec::with_capacity(embeddings.len());
        let mut vectors = Vec::with_capacity(embeddings.len());
        let mut by_id = AHashMap::with_capacity(embeddings.len());

        for embedding in embeddings {
            if embedding.vector.len() != dimension {
                return Err(CivicError::DimensionMismatch {
                    document_id: embedding.document_id,
                    expected: dimension,
                    actual: embedding.vector.len(),
                });
            }
            if by_id.contains_key(&embedding.document_id) {
                return Err(CivicError::Corpus(format!(
                    "More than one current embedding for {}",
                    embedding.document_id
                )));
            }
            by_id.insert(embedding.document_id.clone(), ids.len());
            ids.push(embedding.document_id);
            vectors.push(embedding.vector);
        }

        let candidates = if vectors.len() > config.exact_scan_limit {
            Some(CandidateIndex::build(
                &vectors,
                dimension,
                config.hnsw_m,
                config.hnsw_ef_construction,
            )?)
        } else {
            None
        };

        tracing::info!(
            "Embedding store ready: {} vectors ({}D, {})",
            ids.len(),
            dimension,
            if candidates.is_some() { "hnsw candidates" } else { "exact scan" }
        );

        Ok(Self {
            dimension,
            ids,
            vectors,
            by_id,
            candidates,
            candidate_pool: config.candidate_pool,
            ef_search: config.hnsw_ef_search,
        })
    }

    /// An empty store of the given dimension
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
            by_id: AHashMap::new(),
            candidates: None,
            candidate_pool: 0,
            ef_search: 0,
        }
    }

    pub fn uses_candidate_index(&self) -> bool {
        self.candidates.is_some()
    }
}

impl VectorStore for EmbeddingStore {
    fn similarity_search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> std::result::Result<Vec<(String, f64)>, VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        if limit == 0 || self.ids.is_empty() {
            return Ok(Vec::new());
        }

        let positions: Vec<usize> = match &self.candidates {
            Some(index) => index.candidates(
                vector,
                self.candidate_pool.max(limit).min(self.vectors.len()),
                self.ef_search,
            )?,
            None => (0..self.vectors.len()).collect(),
        };

        let mut scored: Vec<(usize, f64)> = positions
            .into_iter()
            .filter_map(|pos| {
                self.vectors
                    .get(pos)
                    .map(|stored| (pos, cosine_similarity(vector, stored)))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.ids[a.0].cmp(&self.ids[b.0]))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(pos, sim)| (self.ids[pos].clone(), sim))
            .collect())
    }

    fn get_embedding(&self, document_id: &str) -> Option<&[f32]> {
        self.by_id
            .get(document_id)
            .map(|&pos| self.vectors[pos].as_slice())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
