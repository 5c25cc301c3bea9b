//! Answer confidence

use super::{ConfidenceBand, SynthesisMode};
use crate::config::SynthesisConfig;

/// Derive the answer confidence from the fusion confidence
///
/// Fewer than `min_match_count` matches caps it at `sparse_result_cap`, and a
/// heuristic answer never exceeds `fallback_ceiling`. No matches means 0.
pub fn answer_confidence(
    fusion_confidence: f64,
    total_matches: usize,
    mode: SynthesisMode,
    config: &SynthesisConfig,
) -> f64 {
    if total_matches == 0 || !fusion_confidence.is_finite() {
        return 0.0;
    }

    let mut confidence = fusion_confidence.clamp(0.0, 1.0);
    if total_matches < config.min_match_count {
        confidence = confidence.min(config.sparse_result_cap);
    }
    if mode == SynthesisMode::Fallback {
        confidence = confidence.min(config.fallback_ceiling);
    }
    confidence
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceBand::High
        } else if score >= 0.6 {
            ConfidenceBand::Medium
        } else if score > 0.0 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::None
        }
    }
}
