//! Read-only document and embedding snapshot
//!
//! The ingestion side owns these records. A query only ever reads one
//! `Corpus` snapshot, shared behind an `Arc`.

use crate::error::{CivicError, Result};
use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Kind of legislative document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Bill,
    ExecutiveOrder,
    #[serde(other)]
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Bill => "bill",
            DocumentType::ExecutiveOrder => "executive_order",
            DocumentType::Other => "other",
        }
    }

    /// Human-readable plural used in answer text
    pub fn plural_label(&self, count: usize) -> &'static str {
        match (self, count == 1) {
            (DocumentType::Bill, true) => "congressional bill",
            (DocumentType::Bill, false) => "congressional bills",
            (DocumentType::ExecutiveOrder, true) => "executive order",
            (DocumentType::ExecutiveOrder, false) => "executive orders",
            (DocumentType::Other, true) => "other document",
            (DocumentType::Other, false) => "other documents",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "bill" | "bills" => Ok(DocumentType::Bill),
            "executive_order" | "executive_orders" | "eo" => Ok(DocumentType::ExecutiveOrder),
            "other" => Ok(DocumentType::Other),
            other => Err(CivicError::Config(format!("Unknown document type: {}", other))),
        }
    }
}

/// Sponsoring legislator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Sponsor {
    /// "Jane Doe (D-CA)" style label
    pub fn label(&self) -> String {
        match (&self.party, &self.state) {
            (Some(party), Some(state)) => format!("{} ({}-{})", self.full_name, party, state),
            (Some(party), None) => format!("{} ({})", self.full_name, party),
            (None, Some(state)) => format!("{} ({})", self.full_name, state),
            (None, None) => self.full_name.clone(),
        }
    }
}

/// A legislative document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub full_text: String,
    pub document_type: DocumentType,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub introduced_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_action_date: Option<NaiveDate>,
    #[serde(default)]
    pub sponsor: Option<Sponsor>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Subject terms attached by the ingestion side (`subjects` list and `policy_area`)
    pub fn subject_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();

        if let Some(serde_json::Value::Array(subjects)) = self.metadata.get("subjects") {
            terms.extend(
                subjects
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }

        if let Some(area) = self.metadata.get("policy_area").and_then(|v| v.as_str()) {
            let area = area.trim();
            if !area.is_empty() && !terms.iter().any(|t| t.eq_ignore_ascii_case(area)) {
                terms.push(area.to_string());
            }
        }

        terms
    }
}

/// The current embedding of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub document_id: String,
    pub vector: Vec<f32>,
    pub generated_at: DateTime<Utc>,
}

/// On-disk corpus snapshot format
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CorpusFile {
    pub documents: Vec<Document>,
    #[serde(default)]
    pub embeddings: Vec<Embedding>,
}

impl CorpusFile {
    /// Read a corpus snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CivicError::Io {
            source: e,
            context: format!("Failed to read corpus file: {:?}", path),
        })?;

        serde_json::from_str(&content).map_err(|e| CivicError::Json {
            source: e,
            context: format!("Failed to parse corpus file: {:?}", path),
        })
    }

    /// Keep only the newest embedding per document and check dimensionality
    pub fn current_embeddings(&self, dimension: usize) -> Result<Vec<Embedding>> {
        let mut newest: AHashMap<&str, &Embedding> = AHashMap::new();

        for embedding in &self.embeddings {
            if embedding.vector.len() != dimension {
                return Err(CivicError::DimensionMismatch {
                    document_id: embedding.document_id.clone(),
                    expected: dimension,
                    actual: embedding.vector.len(),
                });
            }

            match newest.get(embedding.document_id.as_str()) {
                Some(existing) if existing.generated_at >= embedding.generated_at => {}
                _ => {
                    newest.insert(embedding.document_id.as_str(), embedding);
                }
            }
        }

        let mut current: Vec<Embedding> = newest.into_values().cloned().collect();
        current.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(current)
    }
}

/// Immutable document snapshot with identifier lookup
#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    by_id: AHashMap<String, usize>,
}

impl Corpus {
    /// Build a snapshot, rejecting duplicate identifiers
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let mut by_id = AHashMap::with_capacity(documents.len());

        for (idx, doc) in documents.iter().enumerate() {
            if doc.identifier.trim().is_empty() {
                return Err(CivicError::Corpus(format!(
                    "Document at position {} has an empty identifier",
                    idx
                )));
            }
            if by_id.insert(doc.identifier.clone(), idx).is_some() {
                return Err(CivicError::Corpus(format!(
                    "Duplicate document identifier: {}",
                    doc.identifier
                )));
            }
        }

        Ok(Self { documents, by_id })
    }

    pub fn get(&self, identifier: &str) -> Option<&Document> {
        self.by_id.get(identifier).map(|&idx| &self.documents[idx])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Last-action date used for tie-breaking
    pub fn last_action(&self, identifier: &str) -> Option<NaiveDate> {
        self.get(identifier).and_then(|d| d.last_action_date)
    }

    /// Identifiers of all documents, used to check embedding coverage
    pub fn identifiers(&self) -> HashSet<&str> {
        self.by_id.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn doc(identifier: &str, title: &str) -> Document {
        Document {
            identifier: identifier.to_string(),
            title: title.to_string(),
            summary: String::new(),
            full_text: String::new(),
            document_type: DocumentType::Bill,
            status: "introduced".to_string(),
            introduced_date: None,
            last_action_date: None,
            sponsor: None,
            metadata: serde_json::Map::new(),
        }
    }

    fn embedding(id: &str, vector: Vec<f32>, day: u32) -> Embedding {
        Embedding {
            document_id: id.to_string(),
            vector,
            generated_at: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let result = Corpus::new(vec![doc("HR-1-119", "A"), doc("HR-1-119", "B")]);
        assert!(matches!(result, Err(CivicError::Corpus(_))));
    }

    #[test]
    fn test_lookup_by_identifier() {
        let corpus = Corpus::new(vec![doc("HR-1-119", "A"), doc("S-2-119", "B")]).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("S-2-119").map(|d| d.title.as_str()), Some("B"));
        assert!(corpus.get("EO-3").is_none());
    }

    #[test]
    fn test_unknown_document_type_maps_to_other() {
        let json = r#"{"identifier":"PD-1","title":"Proclamation","document_type":"presidential_document"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.document_type, DocumentType::Other);
    }

    #[test]
    fn test_newest_embedding_wins() {
        let file = CorpusFile {
            documents: vec![],
            embeddings: vec![
                embedding("HR-1", vec![1.0, 0.0], 1),
                embedding("HR-1", vec![0.0, 1.0], 5),
                embedding("HR-1", vec![0.5, 0.5], 3),
            ],
        };
        let current = file.current_embeddings(2).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].vector, vec![0.0, 1.0]);
    }

    #[test]
    fn test_mixed_dimensions_are_fatal() {
        let file = CorpusFile {
            documents: vec![],
            embeddings: vec![
                embedding("HR-1", vec![1.0, 0.0], 1),
                embedding("HR-2", vec![1.0, 0.0, 0.0], 1),
            ],
        };
        assert!(matches!(
            file.current_embeddings(2),
            Err(CivicError::DimensionMismatch { actual: 3, .. })
        ));
    }

    #[test]
    fn test_subject_terms() {
        let mut d = doc("HR-1", "A");
        d.metadata.insert(
            "subjects".to_string(),
            serde_json::json!(["Taxation", "Health"]),
        );
        d.metadata
            .insert("policy_area".to_string(), serde_json::json!("Economics"));
        assert_eq!(d.subject_terms(), vec!["Taxation", "Health", "Economics"]);
    }

    #[test]
    fn test_sponsor_label() {
        let sponsor = Sponsor {
            full_name: "Jane Doe".to_string(),
            party: Some("D".to_string()),
            state: Some("CA".to_string()),
        };
        assert_eq!(sponsor.label(), "Jane Doe (D-CA)");
    }
}
