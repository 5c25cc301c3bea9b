//! Corpus snapshot loading and on-disk keyword index reuse

mod common;

use civiclens::config::KeywordConfig;
use civiclens::corpus::{Corpus, CorpusFile, DocumentType};
use civiclens::embedding::{KeywordIndex, TextIndex};
use civiclens::CivicError;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn write_corpus(dir: &Path, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("corpus.json");
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

#[test]
fn test_load_keeps_newest_embedding() {
    let temp = TempDir::new().unwrap();
    let path = write_corpus(
        temp.path(),
        json!({
            "documents": [
                {
                    "identifier": "HR-1-119",
                    "title": "One Big Beautiful Bill Act",
                    "document_type": "bill",
                    "status": "became law",
                    "last_action_date": "2025-07-04"
                },
                {
                    "identifier": "PD-7",
                    "title": "Proclamation on National Parks Week",
                    "document_type": "presidential_document"
                }
            ],
            "embeddings": [
                {"document_id": "HR-1-119", "vector": [1.0, 0.0, 0.0], "generated_at": "2025-01-01T00:00:00Z"},
                {"document_id": "HR-1-119", "vector": [0.0, 1.0, 0.0], "generated_at": "2025-06-01T00:00:00Z"}
            ]
        }),
    );

    let file = CorpusFile::load(&path).unwrap();
    let embeddings = file.current_embeddings(3).unwrap();
    assert_eq!(embeddings.len(), 1);
    assert_eq!(embeddings[0].vector, vec![0.0, 1.0, 0.0]);

    let corpus = Corpus::new(file.documents).unwrap();
    assert_eq!(corpus.get("PD-7").unwrap().document_type, DocumentType::Other);
    assert_eq!(
        corpus.last_action("HR-1-119"),
        chrono::NaiveDate::from_ymd_opt(2025, 7, 4)
    );
}

#[test]
fn test_wrong_dimension_fails_load() {
    let temp = TempDir::new().unwrap();
    let path = write_corpus(
        temp.path(),
        json!({
            "documents": [{"identifier": "S-5-119", "title": "Laken Riley Act", "document_type": "bill"}],
            "embeddings": [{"document_id": "S-5-119", "vector": [0.5, 0.5], "generated_at": "2025-01-01T00:00:00Z"}]
        }),
    );

    let file = CorpusFile::load(&path).unwrap();
    match file.current_embeddings(384) {
        Err(CivicError::DimensionMismatch {
            document_id,
            expected,
            actual,
        }) => {
            assert_eq!(document_id, "S-5-119");
            assert_eq!(expected, 384);
            assert_eq!(actual, 2);
        }
        other => panic!("expected dimension mismatch, got {other:?}"),
    }
}

#[test]
fn test_duplicate_identifiers_rejected() {
    let mut docs = common::documents();
    docs.push(docs[0].clone());
    assert!(matches!(Corpus::new(docs), Err(CivicError::Corpus(_))));
}

#[test]
fn test_on_disk_index_is_reused_until_stale() {
    let temp = TempDir::new().unwrap();
    let index_dir = temp.path().join("keyword");
    let config = KeywordConfig::default();

    let corpus = Corpus::new(common::documents()).unwrap();
    let built = KeywordIndex::open_or_build(&corpus, &index_dir, &config).unwrap();
    assert_eq!(built.len(), corpus.len() as u64);
    drop(built);

    let reopened = KeywordIndex::open(&index_dir, &config).unwrap();
    let hits = reopened.search("laken riley", 5).unwrap();
    assert_eq!(hits[0].0, "S-5-119");
    drop(reopened);

    let mut smaller = common::documents();
    smaller.truncate(2);
    let smaller = Corpus::new(smaller).unwrap();
    let rebuilt = KeywordIndex::open_or_build(&smaller, &index_dir, &config).unwrap();
    assert_eq!(rebuilt.len(), 2);
}
