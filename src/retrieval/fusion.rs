//! Weighted Reciprocal Rank Fusion across strategy lists

use super::{deduplicate_hits, newest_first, StrategyKind, StrategyOutcome};
use super::{Contribution, FusedResult};
use crate::config::FusionConfig;
use ahash::AHashMap;
use chrono::NaiveDate;
use serde::Serialize;

/// Whether the fused list holds anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionCondition {
    Ranked,
    /// Valid zero-match outcome, not an error
    NoResults,
}

/// Ordered fusion output with an overall confidence
#[derive(Debug, Clone)]
pub struct FusedRanking {
    pub results: Vec<FusedResult>,
    /// Number of distinct documents before the limit was applied
    pub total_candidates: usize,
    /// Top fused score relative to the best achievable score, in [0, 1]
    pub confidence: f64,
    pub condition: FusionCondition,
    /// Weight each live strategy actually used
    pub effective_weights: Vec<(StrategyKind, f64)>,
}

impl FusedRanking {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_candidates: 0,
            confidence: 0.0,
            condition: FusionCondition::NoResults,
            effective_weights: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

struct Accumulator {
    score: f64,
    contributions: Vec<Contribution>,
}

/// Rank fusion engine
///
/// RRF formula: score(id) = sum over live strategies of: weight / (k + rank)
///
/// A failed strategy's weight is redistributed across the live ones in
/// proportion to their configured weights, so the score scale does not depend
/// on which strategies succeeded. Fusion is pure: identical inputs always give
/// the identical total order.
#[derive(Debug, Clone)]
pub struct RankFusion {
    rrf_k: f64,
    weights: [(StrategyKind, f64); 3],
}

impl RankFusion {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            rrf_k: config.rrf_k,
            weights: [
                (StrategyKind::Keyword, config.keyword_weight),
                (StrategyKind::Semantic, config.semantic_weight),
                (StrategyKind::Metadata, config.metadata_weight),
            ],
        }
    }

    pub fn weight(&self, kind: StrategyKind) -> f64 {
        self.weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    fn total_weight(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Highest fused score any document could reach: rank 1 everywhere
    pub fn max_score(&self) -> f64 {
        self.total_weight() / (self.rrf_k + 1.0)
    }

    /// Fuse strategy outcomes into at most `limit` ordered results
    ///
    /// # Arguments
    /// * `outcomes` - One outcome per strategy; failed ones carry no list
    /// * `limit` - Maximum number of results to return
    /// * `last_action` - Last-action date lookup for tie-breaking
    pub fn fuse<F>(&self, outcomes: &[StrategyOutcome], limit: usize, last_action: F) -> FusedRanking
    where
        F: Fn(&str) -> Option<NaiveDate>,
    {
        let mut live: Vec<&StrategyOutcome> = outcomes.iter().filter(|o| o.is_live()).collect();
        live.sort_by_key(|o| o.kind);
        live.dedup_by_key(|o| o.kind);

        let live_weight: f64 = live.iter().map(|o| self.weight(o.kind)).sum();
        if live.is_empty() || live_weight <= 0.0 {
            return FusedRanking::empty();
        }

        let scale = self.total_weight() / live_weight;
        let effective_weights: Vec<(StrategyKind, f64)> = live
            .iter()
            .map(|o| (o.kind, self.weight(o.kind) * scale))
            .collect();

        let mut scores: AHashMap<String, Accumulator> = AHashMap::new();

        for (outcome, (kind, weight)) in live.iter().zip(effective_weights.iter()) {
            let hits = deduplicate_hits(outcome.result.hits.clone());
            for (idx, hit) in hits.into_iter().enumerate() {
                let rank = idx + 1;
                let contribution = weight / (self.rrf_k + rank as f64);
                let entry = scores.entry(hit.document_id).or_insert(Accumulator {
                    score: 0.0,
                    contributions: Vec::new(),
                });
                entry.score += contribution;
                entry.contributions.push(Contribution {
                    strategy: *kind,
                    rank,
                    weight: *weight,
                    score: contribution,
                });
            }
        }

        let mut ordered: Vec<(String, Accumulator, Option<NaiveDate>)> = scores
            .into_iter()
            .map(|(id, acc)| {
                let date = last_action(&id);
                (id, acc, date)
            })
            .collect();

        ordered.sort_by(|a, b| {
            b.1.score
                .total_cmp(&a.1.score)
                .then_with(|| b.1.contributions.len().cmp(&a.1.contributions.len()))
                .then_with(|| newest_first(a.2, b.2))
                .then_with(|| a.0.cmp(&b.0))
        });

        let total_candidates = ordered.len();
        let results: Vec<FusedResult> = ordered
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(idx, (document_id, acc, _))| FusedResult {
                document_id,
                score: acc.score,
                contributions: acc.contributions,
                rank: idx + 1,
            })
            .collect();

        let (confidence, condition) = match results.first() {
            Some(top) => (self.confidence(top.score), FusionCondition::Ranked),
            None => (0.0, FusionCondition::NoResults),
        };

        tracing::debug!(
            "Fused {} candidates from {} live strategies (confidence {:.3})",
            total_candidates,
            live.len(),
            confidence
        );

        FusedRanking {
            results,
            total_candidates,
            confidence,
            condition,
            effective_weights,
        }
    }

    fn confidence(&self, top_score: f64) -> f64 {
        let max = self.max_score();
        if max <= 0.0 || !top_score.is_finite() {
            return 0.0;
        }
        let ratio = top_score / max;
        if ratio > 0.0 {
            ratio.min(1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{StrategyFailure, StrategyHit, StrategyResult};

    fn outcome(kind: StrategyKind, ids: &[&str]) -> StrategyOutcome {
        StrategyOutcome::live(StrategyResult::new(
            kind,
            ids.iter()
                .enumerate()
                .map(|(i, id)| StrategyHit::new(*id, 1.0 / (i as f64 + 1.0)))
                .collect(),
        ))
    }

    fn engine() -> RankFusion {
        RankFusion::new(&FusionConfig::default())
    }

    fn no_dates(_: &str) -> Option<NaiveDate> {
        None
    }

    fn ids(ranking: &FusedRanking) -> Vec<&str> {
        ranking.results.iter().map(|r| r.document_id.as_str()).collect()
    }

    #[test]
    fn test_weighted_rrf_scores() {
        let ranking = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A", "B"]),
                outcome(StrategyKind::Semantic, &["B", "A"]),
                outcome(StrategyKind::Metadata, &["C"]),
            ],
            10,
            no_dates,
        );

        assert_eq!(ids(&ranking), vec!["A", "B", "C"]);
        let a = 0.5 / 61.0 + 0.3 / 62.0;
        assert!((ranking.results[0].score - a).abs() < 1e-12);
        assert_eq!(ranking.results[0].contributions.len(), 2);
        assert_eq!(ranking.results[2].rank, 3);
        assert_eq!(ranking.condition, FusionCondition::Ranked);
    }

    #[test]
    fn test_failed_strategy_weight_redistributed() {
        let ranking = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A"]),
                StrategyOutcome::failed(
                    StrategyKind::Semantic,
                    StrategyFailure::EmbeddingUnavailable("no embeddings".to_string()),
                ),
                outcome(StrategyKind::Metadata, &["B"]),
            ],
            10,
            no_dates,
        );

        let weights: f64 = ranking.effective_weights.iter().map(|(_, w)| w).sum();
        assert!((weights - 1.0).abs() < 1e-12);
        assert!((ranking.results[0].score - (0.5 / 0.7) / 61.0).abs() < 1e-12);
        assert_eq!(ids(&ranking), vec!["A", "B"]);
    }

    #[test]
    fn test_live_but_empty_strategy_keeps_its_weight() {
        let ranking = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A"]),
                outcome(StrategyKind::Semantic, &[]),
                outcome(StrategyKind::Metadata, &[]),
            ],
            10,
            no_dates,
        );
        assert!((ranking.results[0].score - 0.5 / 61.0).abs() < 1e-12);
        assert!((ranking.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tie_breaks() {
        // Equal scores: keyword rank 1 vs semantic rank 1 at equal weights
        let fusion = RankFusion::new(&FusionConfig {
            rrf_k: 60.0,
            keyword_weight: 0.4,
            semantic_weight: 0.4,
            metadata_weight: 0.2,
        });
        let dates = |id: &str| match id {
            "OLD" => NaiveDate::from_ymd_opt(2020, 1, 1),
            "NEW" => NaiveDate::from_ymd_opt(2025, 1, 1),
            _ => None,
        };

        let ranking = fusion.fuse(
            &[
                outcome(StrategyKind::Keyword, &["OLD"]),
                outcome(StrategyKind::Semantic, &["NEW"]),
            ],
            10,
            dates,
        );
        assert_eq!(ids(&ranking), vec!["NEW", "OLD"]);

        let ranking = fusion.fuse(
            &[
                outcome(StrategyKind::Keyword, &["Z"]),
                outcome(StrategyKind::Semantic, &["Y"]),
            ],
            10,
            no_dates,
        );
        assert_eq!(ids(&ranking), vec!["Y", "Z"]);
    }

    #[test]
    fn test_more_strategies_breaks_equal_scores() {
        // 0.2/61 + 0.2/61 == 0.4/61 exactly
        let fusion = RankFusion::new(&FusionConfig {
            rrf_k: 60.0,
            keyword_weight: 0.4,
            semantic_weight: 0.2,
            metadata_weight: 0.2,
        });
        let ranking = fusion.fuse(
            &[
                outcome(StrategyKind::Keyword, &["SOLO"]),
                outcome(StrategyKind::Semantic, &["PAIR"]),
                outcome(StrategyKind::Metadata, &["PAIR"]),
            ],
            10,
            no_dates,
        );
        assert_eq!(ranking.results[0].document_id, "PAIR");
        assert_eq!(ranking.results[0].strategy_count(), 2);
    }

    #[test]
    fn test_deterministic_regardless_of_outcome_order() {
        let outcomes = vec![
            outcome(StrategyKind::Metadata, &["C", "A"]),
            outcome(StrategyKind::Keyword, &["A", "B", "C", "D"]),
            outcome(StrategyKind::Semantic, &["D", "C", "B"]),
        ];
        let mut reversed = outcomes.clone();
        reversed.reverse();

        let first = engine().fuse(&outcomes, 10, no_dates);
        let second = engine().fuse(&reversed, 10, no_dates);
        assert_eq!(first.results, second.results);
        assert!(first
            .results
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_duplicate_hits_count_once() {
        let ranking = engine().fuse(&[outcome(StrategyKind::Keyword, &["A", "A", "B"])], 10, no_dates);
        assert_eq!(ranking.results[0].contributions.len(), 1);
        assert_eq!(ranking.results[1].contributions[0].rank, 2);
    }

    #[test]
    fn test_empty_and_all_failed() {
        let ranking = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &[]),
                outcome(StrategyKind::Semantic, &[]),
            ],
            10,
            no_dates,
        );
        assert!(ranking.is_empty());
        assert_eq!(ranking.confidence, 0.0);
        assert_eq!(ranking.condition, FusionCondition::NoResults);

        let ranking = engine().fuse(
            &[StrategyOutcome::failed(StrategyKind::Keyword, StrategyFailure::TimedOut)],
            10,
            no_dates,
        );
        assert_eq!(ranking.condition, FusionCondition::NoResults);
        assert!(ranking.effective_weights.is_empty());
    }

    #[test]
    fn test_confidence_grows_with_agreement() {
        let one = engine().fuse(&[outcome(StrategyKind::Keyword, &["A"])], 10, no_dates);
        let two = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A"]),
                outcome(StrategyKind::Semantic, &["A"]),
                outcome(StrategyKind::Metadata, &[]),
            ],
            10,
            no_dates,
        );
        let three = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A"]),
                outcome(StrategyKind::Semantic, &["A"]),
                outcome(StrategyKind::Metadata, &["A"]),
            ],
            10,
            no_dates,
        );
        let one_of_three = engine().fuse(
            &[
                outcome(StrategyKind::Keyword, &["A"]),
                outcome(StrategyKind::Semantic, &[]),
                outcome(StrategyKind::Metadata, &[]),
            ],
            10,
            no_dates,
        );

        assert!(one_of_three.confidence < two.confidence);
        assert!(two.confidence < three.confidence);
        assert!((three.confidence - 1.0).abs() < 1e-9);
        assert!(one.confidence > 0.0 && one.confidence <= 1.0);
    }

    #[test]
    fn test_limit_keeps_total() {
        let ranking = engine().fuse(&[outcome(StrategyKind::Keyword, &["A", "B", "C"])], 2, no_dates);
        assert_eq!(ranking.results.len(), 2);
        assert_eq!(ranking.total_candidates, 3);
    }
}
