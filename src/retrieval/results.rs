//! Strategy lists, fused results and the response payload

use super::{StrategyFailure, StrategyKind};
use crate::corpus::{Document, DocumentType};
use crate::synthesis::{ConfidenceBand, FallbackReason, SynthesisMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One document in a strategy's ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyHit {
    pub document_id: String,
    /// Strategy-local score; only the order matters to fusion
    pub score: f64,
}

impl StrategyHit {
    pub fn new(document_id: impl Into<String>, score: f64) -> Self {
        Self {
            document_id: document_id.into(),
            score,
        }
    }
}

/// Ordered output of one strategy for one query
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub kind: StrategyKind,
    pub hits: Vec<StrategyHit>,
}

impl StrategyResult {
    pub fn new(kind: StrategyKind, hits: Vec<StrategyHit>) -> Self {
        Self { kind, hits }
    }

    pub fn empty(kind: StrategyKind) -> Self {
        Self {
            kind,
            hits: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Drop hits rejected by `keep`, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.hits.retain(|hit| keep(&hit.document_id));
    }
}

/// What one strategy added to a fused score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub strategy: StrategyKind,
    /// 1-indexed position in that strategy's list
    pub rank: usize,
    /// Weight after redistribution across live strategies
    pub weight: f64,
    pub score: f64,
}

/// A document in the fused ordering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub document_id: String,
    /// Sum of contributions, never negative
    pub score: f64,
    pub contributions: Vec<Contribution>,
    /// 1-indexed final position
    pub rank: usize,
}

impl FusedResult {
    /// Number of strategies that returned this document
    pub fn strategy_count(&self) -> usize {
        self.contributions.len()
    }

    pub fn matched_by(&self) -> Vec<StrategyKind> {
        self.contributions.iter().map(|c| c.strategy).collect()
    }
}

/// A strategy that did not contribute to the response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedStrategy {
    pub strategy: StrategyKind,
    pub reason: String,
}

impl DegradedStrategy {
    pub fn new(strategy: StrategyKind, failure: &StrategyFailure) -> Self {
        Self {
            strategy,
            reason: failure.to_string(),
        }
    }
}

/// Document as presented in a response
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub identifier: String,
    pub title: String,
    pub summary: String,
    pub document_type: DocumentType,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduced_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_state: Option<String>,
    pub relevance_score: f64,
    pub rank: usize,
    pub matched_by: Vec<StrategyKind>,
}

impl DocumentView {
    pub fn new(document: &Document, fused: &FusedResult) -> Self {
        let sponsor = document.sponsor.as_ref();
        Self {
            identifier: document.identifier.clone(),
            title: document.title.clone(),
            summary: document.summary.clone(),
            document_type: document.document_type,
            status: document.status.clone(),
            introduced_date: document.introduced_date,
            last_action_date: document.last_action_date,
            sponsor_name: sponsor.map(|s| s.full_name.clone()),
            sponsor_party: sponsor.and_then(|s| s.party.clone()),
            sponsor_state: sponsor.and_then(|s| s.state.clone()),
            relevance_score: fused.score,
            rank: fused.rank,
            matched_by: fused.matched_by(),
        }
    }
}

/// Full answer to one search request
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub request_id: Uuid,
    pub query: String,
    pub processed_query: String,
    pub documents: Vec<DocumentView>,
    pub total_results: usize,
    pub returned_results: usize,
    pub search_type: String,
    pub ai_summary: String,
    pub confidence_score: f64,
    pub confidence_band: ConfidenceBand,
    pub synthesis_mode: SynthesisMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    pub source_documents: Vec<String>,
    pub suggestions: Vec<String>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_strategies: Vec<DegradedStrategy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::doc;
    use crate::corpus::Sponsor;

    #[test]
    fn test_retain_preserves_order() {
        let mut result = StrategyResult::new(
            StrategyKind::Keyword,
            vec![
                StrategyHit::new("A", 3.0),
                StrategyHit::new("B", 2.0),
                StrategyHit::new("C", 1.0),
            ],
        );
        result.retain(|id| id != "B");
        let ids: Vec<&str> = result.hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_document_view_carries_fusion_details() {
        let mut d = doc("S-5-119", "Laken Riley Act");
        d.sponsor = Some(Sponsor {
            full_name: "Katie Britt".to_string(),
            party: Some("R".to_string()),
            state: Some("AL".to_string()),
        });
        let fused = FusedResult {
            document_id: "S-5-119".to_string(),
            score: 0.01,
            contributions: vec![
                Contribution {
                    strategy: StrategyKind::Keyword,
                    rank: 1,
                    weight: 0.5,
                    score: 0.5 / 61.0,
                },
                Contribution {
                    strategy: StrategyKind::Metadata,
                    rank: 2,
                    weight: 0.2,
                    score: 0.2 / 62.0,
                },
            ],
            rank: 1,
        };

        let view = DocumentView::new(&d, &fused);
        assert_eq!(view.sponsor_state.as_deref(), Some("AL"));
        assert_eq!(view.matched_by, vec![StrategyKind::Keyword, StrategyKind::Metadata]);
        assert_eq!(fused.strategy_count(), 2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["document_type"], "bill");
        assert!(json.get("introduced_date").is_none());
    }
}
