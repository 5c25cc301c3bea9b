/// Tantivy keyword index over document title, summary and full text
use crate::config::KeywordConfig;
use crate::corpus::Corpus;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeywordIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),

    #[error("Query parsing error: {0}")]
    QueryParseError(String),
}

/// Lexical search consumed by the keyword strategy
pub trait TextIndex: Send + Sync {
    /// Up to `limit` (document_id, relevance) pairs, most relevant first
    fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>, KeywordIndexError>;
}

const WRITER_HEAP_BYTES: usize = 50_000_000;

struct Fields {
    identifier: Field,
    title: Field,
    summary: Field,
    body: Field,
}

impl Fields {
    fn schema() -> (Schema, Fields) {
        let mut schema_builder = Schema::builder();

        let identifier = schema_builder.add_text_field("identifier", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT);
        let summary = schema_builder.add_text_field("summary", TEXT);
        let body = schema_builder.add_text_field("body", TEXT);

        (
            schema_builder.build(),
            Fields {
                identifier,
                title,
                summary,
                body,
            },
        )
    }

    fn from_schema(schema: &Schema) -> Result<Fields, KeywordIndexError> {
        let field = |name: &str| {
            schema.get_field(name).map_err(|_| {
                KeywordIndexError::InitializationError(format!("Missing '{}' field in schema", name))
            })
        };

        Ok(Fields {
            identifier: field("identifier")?,
            title: field("title")?,
            summary: field("summary")?,
            body: field("body")?,
        })
    }
}

/// Tantivy keyword index wrapper
///
/// BM25 ranking with per-field boosts. Built once from a corpus snapshot and
/// read-only afterwards.
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    boosts: [f32; 3],
}

impl KeywordIndex {
    /// Build an in-memory index over every document in the corpus
    pub fn build_in_ram(corpus: &Corpus, config: &KeywordConfig) -> Result<Self, KeywordIndexError> {
        let (schema, fields) = Fields::schema();
        let index = Index::create_in_ram(schema);
        Self::populate(index, fields, corpus, config)
    }

    /// Build an on-disk index, replacing whatever the directory held
    pub fn build_in_dir(
        corpus: &Corpus,
        index_path: &Path,
        config: &KeywordConfig,
    ) -> Result<Self, KeywordIndexError> {
        std::fs::create_dir_all(index_path)?;

        let (index, fields) = if index_path.join("meta.json").exists() {
            let index = Index::open_in_dir(index_path)
                .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;
            let fields = Fields::from_schema(&index.schema())?;
            (index, fields)
        } else {
            let (schema, fields) = Fields::schema();
            let index = Index::create_in_dir(index_path, schema)
                .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;
            (index, fields)
        };

        Self::populate(index, fields, corpus, config)
    }

    /// Reopen a previously built index without touching its contents
    pub fn open(index_path: &Path, config: &KeywordConfig) -> Result<Self, KeywordIndexError> {
        if !index_path.join("meta.json").exists() {
            return Err(KeywordIndexError::InitializationError(format!(
                "No index found at {}",
                index_path.display()
            )));
        }

        let index = Index::open_in_dir(index_path)
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;
        let fields = Fields::from_schema(&index.schema())?;
        let reader = Self::reader(&index)?;

        Ok(Self {
            index,
            reader,
            fields,
            boosts: boosts(config),
        })
    }

    /// Reuse the on-disk index when it already covers the corpus, rebuild otherwise
    pub fn open_or_build(
        corpus: &Corpus,
        index_path: &Path,
        config: &KeywordConfig,
    ) -> Result<Self, KeywordIndexError> {
        if let Ok(existing) = Self::open(index_path, config) {
            if existing.len() == corpus.len() as u64 {
                tracing::info!("Reusing keyword index at {}", index_path.display());
                return Ok(existing);
            }
            tracing::info!(
                "Keyword index at {} is stale ({} docs, corpus has {}), rebuilding",
                index_path.display(),
                existing.len(),
                corpus.len()
            );
        }

        Self::build_in_dir(corpus, index_path, config)
    }

    fn populate(
        index: Index,
        fields: Fields,
        corpus: &Corpus,
        config: &KeywordConfig,
    ) -> Result<Self, KeywordIndexError> {
        {
            let mut writer: IndexWriter = index
                .writer_with_num_threads(1, WRITER_HEAP_BYTES)
                .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

            writer
                .delete_all_documents()
                .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

            for document in corpus.iter() {
                writer
                    .add_document(doc!(
                        fields.identifier => document.identifier.as_str(),
                        fields.title => document.title.as_str(),
                        fields.summary => document.summary.as_str(),
                        fields.body => document.full_text.as_str(),
                    ))
                    .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;
            }

            writer
                .commit()
                .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;
        }

        let reader = Self::reader(&index)?;

        tracing::info!("Indexed {} documents for keyword search", corpus.len());

        Ok(Self {
            index,
            reader,
            fields,
            boosts: boosts(config),
        })
    }

    fn reader(index: &Index) -> Result<IndexReader, KeywordIndexError> {
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: TantivyError| KeywordIndexError::InitializationError(e.to_string()))?;

        reader
            .reload()
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        Ok(reader)
    }

    /// Get the number of documents in the index
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn boosts(config: &KeywordConfig) -> [f32; 3] {
    [config.title_boost, config.summary_boost, config.body_boost]
}

/// Reduce free text to plain lowercase terms so it can never be read as
/// query syntax
fn sanitize(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl TextIndex for KeywordIndex {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>, KeywordIndexError> {
        let cleaned = sanitize(query);
        if cleaned.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let limit = limit.min(searcher.num_docs() as usize);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut query_parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.summary, self.fields.body],
        );
        query_parser.set_field_boost(self.fields.title, self.boosts[0]);
        query_parser.set_field_boost(self.fields.summary, self.boosts[1]);
        query_parser.set_field_boost(self.fields.body, self.boosts[2]);

        let parsed = query_parser
            .parse_query(&cleaned)
            .map_err(|e| KeywordIndexError::QueryParseError(e.to_string()))?;

        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(limit))
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

            let identifier = retrieved
                .get_first(self.fields.identifier)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    KeywordIndexError::SearchError("Missing identifier field".to_string())
                })?;

            results.push((identifier.to_string(), score));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::doc;
    use tempfile::TempDir;

    fn corpus() -> Corpus {
        let mut infra = doc("HR-3684-117", "Infrastructure Investment and Jobs Act");
        infra.summary = "Funds roads, bridges, broadband and transit.".to_string();

        let mut farm = doc("HR-2-118", "Farm Bill");
        farm.full_text = "Crop insurance and rural broadband provisions.".to_string();

        let defense = doc("S-1-118", "National Defense Authorization Act");

        Corpus::new(vec![infra, farm, defense]).unwrap()
    }

    #[test]
    fn test_search_across_fields() {
        let index = KeywordIndex::build_in_ram(&corpus(), &KeywordConfig::default()).unwrap();
        assert_eq!(index.len(), 3);

        let results = index.search("broadband", 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        // summary outweighs body
        assert_eq!(ids[0], "HR-3684-117");
    }

    #[test]
    fn test_title_boost_dominates() {
        let index = KeywordIndex::build_in_ram(&corpus(), &KeywordConfig::default()).unwrap();
        let results = index.search("defense", 10).unwrap();
        assert_eq!(results[0].0, "S-1-118");
    }

    #[test]
    fn test_query_syntax_is_neutralized() {
        let index = KeywordIndex::build_in_ram(&corpus(), &KeywordConfig::default()).unwrap();
        assert!(index.search("farm AND (bill", 10).is_ok());
        assert!(index.search("\"unterminated", 10).is_ok());
        assert!(index.search("+-:*", 10).unwrap().is_empty());
    }

    #[test]
    fn test_zero_limit() {
        let index = KeywordIndex::build_in_ram(&corpus(), &KeywordConfig::default()).unwrap();
        assert!(index.search("farm", 0).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_limit_bounded_by_index_size() {
        let index = KeywordIndex::build_in_ram(&corpus(), &KeywordConfig::default()).unwrap();
        let results = index.search("broadband", usize::MAX).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_reopen_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("keyword");

        {
            let index = KeywordIndex::build_in_dir(&corpus(), &path, &KeywordConfig::default()).unwrap();
            assert_eq!(index.len(), 3);
        }

        let reopened = KeywordIndex::open(&path, &KeywordConfig::default()).unwrap();
        assert_eq!(reopened.search("farm", 5).unwrap()[0].0, "HR-2-118");

        // Rebuilding replaces instead of appending
        let rebuilt = KeywordIndex::build_in_dir(&corpus(), &path, &KeywordConfig::default()).unwrap();
        assert_eq!(rebuilt.len(), 3);
    }

    #[test]
    fn test_open_or_build_reuses_matching_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("keyword");

        assert!(KeywordIndex::open(&path, &KeywordConfig::default()).is_err());
        let built = KeywordIndex::open_or_build(&corpus(), &path, &KeywordConfig::default()).unwrap();
        assert_eq!(built.len(), 3);
        let reused = KeywordIndex::open_or_build(&corpus(), &path, &KeywordConfig::default()).unwrap();
        assert_eq!(reused.len(), 3);
    }
}
