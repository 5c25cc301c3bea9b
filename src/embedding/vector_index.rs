/// HNSW candidate pool for large embedding stores
use hnsw_rs::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// Maximum number of layers in the HNSW graph
const MAX_LAYER: usize = 16;

/// Approximate nearest-neighbour index over the store's vectors
///
/// Only narrows the search. Callers re-score every candidate with exact
/// double precision cosine, so approximation never reaches the ranking.
pub struct CandidateIndex {
    index: Hnsw<'static, f32, DistCosine>,
    dimension: usize,
    count: usize,
}

impl CandidateIndex {
    /// Build the graph over `vectors`; a vector's position is its candidate id
    ///
    /// # Arguments
    /// * `dimension` - Vector dimension (must match every vector)
    /// * `m` - HNSW M parameter (number of connections per layer)
    /// * `ef_construction` - HNSW construction parameter (higher = better recall, slower build)
    pub fn build(
        vectors: &[Vec<f32>],
        dimension: usize,
        m: usize,
        ef_construction: usize,
    ) -> Result<Self, VectorIndexError> {
        if m == 0 || ef_construction == 0 {
            return Err(VectorIndexError::InitializationError(
                "HNSW parameters must be greater than 0".to_string(),
            ));
        }

        let index = Hnsw::<f32, DistCosine>::new(
            m,
            vectors.len().max(1),
            MAX_LAYER,
            ef_construction,
            DistCosine,
        );

        for (idx, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            index.insert((vector.as_slice(), idx));
        }

        tracing::info!(
            "Built HNSW candidate index over {} vectors ({}D, M={}, ef_construction={})",
            vectors.len(),
            dimension,
            m,
            ef_construction
        );

        Ok(Self {
            index,
            dimension,
            count: vectors.len(),
        })
    }

    /// Positions of up to `k` approximate nearest neighbours
    ///
    /// # Arguments
    /// * `query` - Query vector
    /// * `k` - Number of candidates to return
    /// * `ef_search` - HNSW search parameter (higher = better recall, slower search)
    pub fn candidates(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<usize>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let k = k.min(self.count);
        if k == 0 {
            return Ok(Vec::new());
        }

        let neighbours = self.index.search(query, k, ef_search.max(k));
        Ok(neighbours.into_iter().map(|n| n.d_id).collect())
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
