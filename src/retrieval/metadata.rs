//! Structured-field matching: identifiers, sponsors and document types

use super::{rank_order, RetrievalStrategy, StrategyFailure, StrategyHit, StrategyKind, StrategyResult};
use crate::corpus::{Corpus, Document, DocumentType};
use crate::query::NormalizedQuery;
use std::sync::Arc;

const EXACT_ID_SCORE: f64 = 1.0;
const PREFIX_ID_BASE: f64 = 0.5;
const PREFIX_ID_SPAN: f64 = 0.4;
const SPONSOR_SPAN: f64 = 0.8;
const TYPE_ONLY_SCORE: f64 = 0.2;
const TYPE_BONUS: f64 = 0.1;
const MIN_SPONSOR_CHARS: usize = 3;

/// Words that only narrow the result set and never name a subject
const QUALIFIERS: &[&str] = &["recent", "latest", "new", "all", "show", "list", "current"];

/// Metadata strategy
///
/// Scores are binary-ish: an exact identifier hit is 1.0, prefix and sponsor
/// hits scale with how much of the field the query covers. This never fails;
/// the corpus snapshot is always in memory.
pub struct MetadataStrategy {
    corpus: Arc<Corpus>,
}

/// Document type implied by the query, and whether the query says nothing else
struct TypeCue {
    kind: DocumentType,
    only: bool,
}

impl MetadataStrategy {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    fn identifier_candidates(query: &NormalizedQuery) -> Vec<String> {
        let mut candidates: Vec<String> = query.identifiers.iter().map(|id| id.to_uppercase()).collect();
        for term in &query.terms {
            if term.chars().any(|c| c.is_ascii_digit()) {
                let upper = term.to_uppercase();
                if !candidates.contains(&upper) {
                    candidates.push(upper);
                }
            }
        }
        candidates
    }

    /// Lowercase words that may name a person
    fn name_terms(query: &NormalizedQuery) -> Vec<String> {
        query
            .terms
            .iter()
            .filter(|t| !query.identifiers.contains(t))
            .filter(|t| !t.chars().any(|c| c.is_ascii_digit()))
            .map(|t| t.to_lowercase())
            .collect()
    }

    fn type_cue(query: &NormalizedQuery) -> Option<TypeCue> {
        let terms: Vec<String> = query.terms.iter().map(|t| t.to_lowercase()).collect();
        let mut kind = None;
        let mut type_words = vec![false; terms.len()];

        for (i, term) in terms.iter().enumerate() {
            match term.as_str() {
                "executive" if matches!(terms.get(i + 1).map(String::as_str), Some("order" | "orders")) => {
                    kind = Some(DocumentType::ExecutiveOrder);
                    type_words[i] = true;
                    type_words[i + 1] = true;
                }
                "bill" | "bills" | "legislation" => {
                    if kind.is_none() {
                        kind = Some(DocumentType::Bill);
                    }
                    type_words[i] = true;
                }
                _ => {}
            }
        }

        let kind = kind?;
        let only = terms
            .iter()
            .zip(type_words.iter())
            .all(|(term, is_type)| *is_type || QUALIFIERS.contains(&term.as_str()));

        Some(TypeCue { kind, only })
    }

    fn identifier_score(document: &Document, candidates: &[String]) -> f64 {
        let id = document.identifier.to_uppercase();
        let mut best: f64 = 0.0;
        for candidate in candidates {
            if id == *candidate {
                return EXACT_ID_SCORE;
            }
            if id.starts_with(&format!("{}-", candidate)) {
                let ratio = candidate.len() as f64 / id.len() as f64;
                best = best.max(PREFIX_ID_BASE + PREFIX_ID_SPAN * ratio);
            }
        }
        best
    }

    /// Longest run of query words found as whole words in the sponsor name,
    /// scored by how much of the name it spans
    fn sponsor_score(document: &Document, name_terms: &[String]) -> f64 {
        let Some(sponsor) = &document.sponsor else {
            return 0.0;
        };
        let name = normalize_name(&sponsor.full_name);
        if name.is_empty() {
            return 0.0;
        }
        let padded = format!(" {} ", name);

        // A run that is absent from the name stays absent when extended, so
        // each start grows until the first miss or until it outgrows the name
        let mut longest = 0usize;
        let mut gram = String::with_capacity(name.len() + 2);
        for start in 0..name_terms.len() {
            gram.clear();
            gram.push(' ');
            for term in &name_terms[start..] {
                gram.push_str(term);
                gram.push(' ');
                if gram.len() > padded.len() || !padded.contains(gram.as_str()) {
                    break;
                }
                let span = gram.len() - 2;
                if span >= MIN_SPONSOR_CHARS && span > longest {
                    longest = span;
                }
            }
        }

        if longest == 0 {
            0.0
        } else {
            SPONSOR_SPAN * (longest as f64 / name.len() as f64).min(1.0)
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl RetrievalStrategy for MetadataStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Metadata
    }

    fn retrieve(
        &self,
        query: &NormalizedQuery,
        limit: usize,
    ) -> Result<StrategyResult, StrategyFailure> {
        if limit == 0 {
            return Ok(StrategyResult::empty(StrategyKind::Metadata));
        }

        let candidates = Self::identifier_candidates(query);
        let name_terms = Self::name_terms(query);
        let type_cue = Self::type_cue(query);

        let mut scored = Vec::new();
        for document in self.corpus.iter() {
            let mut score = Self::identifier_score(document, &candidates)
                .max(Self::sponsor_score(document, &name_terms));

            if let Some(cue) = &type_cue {
                if document.document_type == cue.kind {
                    if cue.only {
                        score = score.max(TYPE_ONLY_SCORE);
                    } else if score > 0.0 {
                        score = (score + TYPE_BONUS).min(1.0);
                    }
                }
            }

            if score > 0.0 {
                scored.push((document.identifier.as_str(), score, document.last_action_date));
            }
        }

        scored.sort_by(|a, b| rank_order(*a, *b));
        scored.truncate(limit);

        tracing::debug!(
            "Metadata strategy matched {} documents ({} identifier candidates)",
            scored.len(),
            candidates.len()
        );

        Ok(StrategyResult::new(
            StrategyKind::Metadata,
            scored
                .into_iter()
                .map(|(id, score, _)| StrategyHit::new(id, score))
                .collect(),
        ))
    }
}
