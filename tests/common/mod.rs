//! Shared fixtures and stub collaborators for integration tests
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use civiclens::config::Config;
use civiclens::corpus::{Corpus, Document, DocumentType, Embedding, Sponsor};
use civiclens::embedding::{
    EmbeddingError, EmbeddingProvider, EmbeddingStore, KeywordIndex, KeywordIndexError, TextIndex,
};
use civiclens::retrieval::HybridSearcher;
use civiclens::synthesis::{
    CompletionClient, CompletionFuture, CompletionRequest, GenerationError, ResponseSynthesizer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DIMENSION: usize = 256;

/// Bag-of-words embedder: each token bumps one FNV-hashed bucket
pub struct HashingEmbedder {
    pub dimension: usize,
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl HashingEmbedder {
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            v[(fnv1a(token) % self.dimension as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }
        Ok(self.vector(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Wraps an embedder and counts calls
pub struct CountingEmbedder {
    pub inner: HashingEmbedder,
    pub calls: Arc<AtomicUsize>,
}

impl EmbeddingProvider for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension
    }

    fn model_name(&self) -> &str {
        "counting"
    }
}

/// Embedder whose backend is always down
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::GenerationError("backend unreachable".to_string()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Wraps a text index and counts searches
pub struct CountingIndex {
    pub inner: KeywordIndex,
    pub calls: Arc<AtomicUsize>,
}

impl TextIndex for CountingIndex {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>, KeywordIndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query, limit)
    }
}

/// Completion client with a fixed script
pub enum Scripted {
    Reply(String),
    Fail,
    Slow(Duration),
}

impl CompletionClient for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, _request: CompletionRequest) -> CompletionFuture<'_> {
        Box::pin(async move {
            match self {
                Scripted::Reply(text) => Ok(text.clone()),
                Scripted::Fail => Err(GenerationError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
                Scripted::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok("too late".to_string())
                }
            }
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn document(
    identifier: &str,
    title: &str,
    summary: &str,
    document_type: DocumentType,
    status: &str,
    sponsor: Option<(&str, &str, &str)>,
    last_action: Option<NaiveDate>,
    subjects: &[&str],
) -> Document {
    let mut metadata = serde_json::Map::new();
    metadata.insert(
        "subjects".to_string(),
        serde_json::Value::Array(
            subjects
                .iter()
                .map(|s| serde_json::Value::String(s.to_string()))
                .collect(),
        ),
    );

    Document {
        identifier: identifier.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
        full_text: String::new(),
        document_type,
        status: status.to_string(),
        introduced_date: last_action,
        last_action_date: last_action,
        sponsor: sponsor.map(|(name, party, state)| Sponsor {
            full_name: name.to_string(),
            party: Some(party.to_string()),
            state: Some(state.to_string()),
        }),
        metadata,
    }
}

/// Small legislative corpus
pub fn documents() -> Vec<Document> {
    vec![
        document(
            "S-2556-119",
            "Rural Broadband Deployment Act",
            "S. 2556 expands rural broadband grants for tribal and farming communities.",
            DocumentType::Bill,
            "introduced",
            Some(("Maria Cantwell", "D", "WA")),
            date(2025, 7, 24),
            &["Telecommunications", "Rural areas"],
        ),
        document(
            "HR-1-119",
            "One Big Beautiful Bill Act",
            "Budget reconciliation legislation covering taxes and spending.",
            DocumentType::Bill,
            "became law",
            Some(("Jodey Arrington", "R", "TX")),
            date(2025, 7, 4),
            &["Taxation", "Budget"],
        ),
        document(
            "HR-10-119",
            "Beautiful Parks and Big Trails Bill",
            "Funds trail maintenance in national parks.",
            DocumentType::Bill,
            "introduced",
            Some(("Bruce Westerman", "R", "AR")),
            date(2025, 2, 11),
            &["Public lands"],
        ),
        document(
            "HR-2-119",
            "Farm Credit Modernization Act",
            "Updates farm credit lending rules for rural lenders.",
            DocumentType::Bill,
            "passed house",
            None,
            date(2025, 3, 3),
            &["Agriculture", "Rural areas"],
        ),
        document(
            "EO-14001",
            "Protecting American Workers",
            "Directs agencies to review workforce training programs.",
            DocumentType::ExecutiveOrder,
            "signed",
            None,
            date(2025, 1, 20),
            &["Labor"],
        ),
        document(
            "S-5-119",
            "Laken Riley Act",
            "Requires detention of certain noncitizens charged with theft.",
            DocumentType::Bill,
            "became law",
            Some(("Katie Britt", "R", "AL")),
            date(2025, 1, 29),
            &["Immigration"],
        ),
    ]
}

pub fn embeddings(documents: &[Document]) -> Vec<Embedding> {
    let embedder = HashingEmbedder {
        dimension: DIMENSION,
    };
    documents
        .iter()
        .map(|d| Embedding {
            document_id: d.identifier.clone(),
            vector: embedder.vector(&format!("{} {}", d.title, d.summary)),
            generated_at: Utc::now(),
        })
        .collect()
}

pub enum EmbedderKind {
    Hashing,
    Failing,
    Missing,
}

pub enum Generation {
    Disabled,
    Client(Scripted),
}

pub struct Harness {
    pub searcher: HybridSearcher,
    pub index_calls: Arc<AtomicUsize>,
    pub embed_calls: Arc<AtomicUsize>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.embedding.dimension = DIMENSION;
    config.llm.enabled = true;
    config.llm.timeout_ms = 100;
    config
}

pub fn harness(embedder: EmbedderKind, generation: Generation) -> Harness {
    let config = test_config();
    let docs = documents();
    let vectors = embeddings(&docs);
    let corpus = Arc::new(Corpus::new(docs).unwrap());

    let index_calls = Arc::new(AtomicUsize::new(0));
    let embed_calls = Arc::new(AtomicUsize::new(0));

    let text_index = Arc::new(CountingIndex {
        inner: KeywordIndex::build_in_ram(&corpus, &config.keyword).unwrap(),
        calls: Arc::clone(&index_calls),
    });
    let store = Arc::new(EmbeddingStore::new(DIMENSION, vectors, &config.semantic).unwrap());

    let embedder: Option<Arc<dyn EmbeddingProvider>> = match embedder {
        EmbedderKind::Hashing => Some(Arc::new(CountingEmbedder {
            inner: HashingEmbedder {
                dimension: DIMENSION,
            },
            calls: Arc::clone(&embed_calls),
        })),
        EmbedderKind::Failing => Some(Arc::new(FailingEmbedder)),
        EmbedderKind::Missing => None,
    };

    let synthesizer = match generation {
        Generation::Disabled => ResponseSynthesizer::heuristic(&config.synthesis),
        Generation::Client(client) => {
            ResponseSynthesizer::with_client(Arc::new(client), &config.synthesis, &config.llm)
        }
    };

    let searcher =
        HybridSearcher::new(&config, corpus, text_index, store, embedder, synthesizer).unwrap();

    Harness {
        searcher,
        index_calls,
        embed_calls,
    }
}
