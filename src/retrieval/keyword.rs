//! Lexical ranking with an exact-phrase title bonus

use super::{rank_order, RetrievalStrategy, StrategyFailure, StrategyHit, StrategyKind, StrategyResult};
use crate::config::KeywordConfig;
use crate::corpus::Corpus;
use crate::embedding::TextIndex;
use crate::query::NormalizedQuery;
use std::sync::Arc;

/// Keyword strategy over the text index
///
/// Titles containing the query phrase verbatim get a fixed multiplicative
/// boost on top of the index's BM25 score, so an official short title beats
/// documents that merely share its words.
pub struct KeywordStrategy {
    index: Arc<dyn TextIndex>,
    corpus: Arc<Corpus>,
    phrase_boost: f64,
    phrase_min_tokens: usize,
}

impl KeywordStrategy {
    pub fn new(index: Arc<dyn TextIndex>, corpus: Arc<Corpus>, config: &KeywordConfig) -> Self {
        Self {
            index,
            corpus,
            phrase_boost: config.phrase_boost,
            phrase_min_tokens: config.phrase_min_tokens.max(1),
        }
    }

    /// Phrases eligible for the title bonus, already in padded match form
    fn boost_phrases(&self, query: &NormalizedQuery) -> Vec<String> {
        let mut phrases = Vec::new();
        for candidate in std::iter::once(&query.phrase).chain(query.key_phrases.iter()) {
            let normalized = normalize_for_match(candidate);
            if normalized.split_whitespace().count() < self.phrase_min_tokens {
                continue;
            }
            let padded = format!(" {} ", normalized);
            if !phrases.contains(&padded) {
                phrases.push(padded);
            }
        }
        phrases
    }
}

/// Lowercase alphanumeric words separated by single spaces
fn normalize_for_match(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl RetrievalStrategy for KeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    fn retrieve(
        &self,
        query: &NormalizedQuery,
        limit: usize,
    ) -> Result<StrategyResult, StrategyFailure> {
        if limit == 0 {
            return Ok(StrategyResult::empty(StrategyKind::Keyword));
        }

        // Over-fetch so a boosted title just outside the window can still move up
        let raw = self
            .index
            .search(&query.canonical, limit.saturating_mul(2))
            .map_err(|e| StrategyFailure::IndexUnavailable(e.to_string()))?;

        let phrases = self.boost_phrases(query);

        let mut scored = Vec::with_capacity(raw.len());
        for (document_id, bm25) in raw {
            let Some(document) = self.corpus.get(&document_id) else {
                tracing::debug!("Keyword hit {} is not in the corpus snapshot", document_id);
                continue;
            };

            let mut score = bm25 as f64;
            if !phrases.is_empty() {
                let title = format!(" {} ", normalize_for_match(&document.title));
                if phrases.iter().any(|p| title.contains(p.as_str())) {
                    score *= self.phrase_boost;
                }
            }
            scored.push((document_id, score, document.last_action_date));
        }

        scored.sort_by(|a, b| rank_order((a.0.as_str(), a.1, a.2), (b.0.as_str(), b.1, b.2)));
        scored.truncate(limit);

        tracing::debug!(
            "Keyword strategy matched {} documents for '{}'",
            scored.len(),
            query.canonical
        );

        Ok(StrategyResult::new(
            StrategyKind::Keyword,
            scored
                .into_iter()
                .map(|(id, score, _)| StrategyHit::new(id, score))
                .collect(),
        ))
    }
}
