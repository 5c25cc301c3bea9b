//! Hybrid retrieval
//!
//! Three independent strategies (keyword, semantic, metadata) rank the corpus
//! for a normalized query, and weighted Reciprocal Rank Fusion merges their
//! lists into one ordered, confidence-scored result set.

mod deduplication;
mod fusion;
mod hybrid;
mod keyword;
mod metadata;
mod results;
mod semantic;

pub use deduplication::deduplicate_hits;
pub use fusion::{FusedRanking, FusionCondition, RankFusion};
pub use hybrid::HybridSearcher;
pub use keyword::KeywordStrategy;
pub use metadata::MetadataStrategy;
pub use results::{
    Contribution, DegradedStrategy, DocumentView, FusedResult, SearchResponse, StrategyHit,
    StrategyResult,
};
pub use semantic::SemanticStrategy;

use crate::corpus::{Document, DocumentType};
use crate::query::NormalizedQuery;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// The retrieval strategies, in fusion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Keyword,
    Semantic,
    Metadata,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Keyword,
        StrategyKind::Semantic,
        StrategyKind::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Keyword => "keyword",
            StrategyKind::Semantic => "semantic",
            StrategyKind::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a strategy produced no list for this query
///
/// Recovered inside the engine by weight redistribution; never shown to the
/// caller as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyFailure {
    #[error("text index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("embeddings unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("timed out")]
    TimedOut,

    #[error("aborted: {0}")]
    Aborted(String),
}

/// One ranking strategy over the shared read-only corpus
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Rank up to `limit` documents for the query
    fn retrieve(
        &self,
        query: &NormalizedQuery,
        limit: usize,
    ) -> Result<StrategyResult, StrategyFailure>;
}

/// What the fusion engine receives from one strategy
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub kind: StrategyKind,
    pub result: StrategyResult,
    pub failure: Option<StrategyFailure>,
}

impl StrategyOutcome {
    pub fn live(result: StrategyResult) -> Self {
        Self {
            kind: result.kind,
            result,
            failure: None,
        }
    }

    pub fn failed(kind: StrategyKind, failure: StrategyFailure) -> Self {
        Self {
            kind,
            result: StrategyResult::empty(kind),
            failure: Some(failure),
        }
    }

    /// A strategy that ran, even if it matched nothing
    pub fn is_live(&self) -> bool {
        self.failure.is_none()
    }
}

/// Search request as received from the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            offset: None,
            filters: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }
}

/// Optional structured filters, applied to every strategy list before fusion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub sponsor: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        *self == SearchFilters::default()
    }

    /// Whether a document passes every filter that is set
    ///
    /// Date bounds are inclusive and compare against the introduced date; a
    /// document without one fails any date bound.
    pub fn matches(&self, document: &Document) -> bool {
        if let Some(kind) = self.document_type {
            if document.document_type != kind {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if !document.status.eq_ignore_ascii_case(status.trim()) {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(introduced) = document.introduced_date else {
                return false;
            };
            if self.date_from.is_some_and(|from| introduced < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| introduced > to) {
                return false;
            }
        }

        if let Some(sponsor) = &self.sponsor {
            let wanted = sponsor.trim().to_lowercase();
            match &document.sponsor {
                Some(s) if s.full_name.to_lowercase().contains(&wanted) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Shared ordering for strategy lists: score descending, then most recent
/// last action (undated last), then identifier
pub(crate) fn rank_order(
    a: (&str, f64, Option<NaiveDate>),
    b: (&str, f64, Option<NaiveDate>),
) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| newest_first(a.2, b.2))
        .then_with(|| a.0.cmp(b.0))
}

/// Most recent date first, missing dates last
pub(crate) fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
