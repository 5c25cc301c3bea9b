//! Duplicate removal within a strategy list

use crate::retrieval::StrategyHit;
use std::collections::HashSet;

/// Deduplicate hits by document id, keeping the first (best ranked) instance
///
/// # Arguments
/// * `hits` - Ranked hits potentially with duplicates
///
/// # Returns
/// Deduplicated hits, maintaining rank order
pub fn deduplicate_hits(hits: Vec<StrategyHit>) -> Vec<StrategyHit> {
    let mut seen: HashSet<String> = HashSet::new();

    hits.into_iter()
        .filter(|hit| seen.insert(hit.document_id.clone()))
        .collect()
}
