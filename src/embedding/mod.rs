mod keyword_index;
/// Retrieval collaborators
///
/// Architecture:
/// - EmbeddingProvider trait for the injected query embedder
/// - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
/// - EmbeddingStore for exact cosine scoring, with HNSW candidates at scale
/// - Tantivy for BM25 keyword search
mod provider;
mod store;
mod vector_index;

pub use keyword_index::{KeywordIndex, KeywordIndexError, TextIndex};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use store::{EmbeddingStore, VectorStore};
pub use vector_index::{CandidateIndex, VectorIndexError};

/// Cosine similarity computed in double precision
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
