//! Follow-up query suggestions from document metadata

use crate::corpus::{Document, DocumentType};
use crate::query::NormalizedQuery;
use ahash::AHashMap;

const TITLE_STOP_WORDS: &[&str] = &["bill", "act", "resolution", "order", "executive", "other", "their", "which", "under"];

/// Up to `max` suggestions, independent of any generative call
///
/// Subject terms shared by several documents come first, then distinctive
/// title words, then a browse-by-type suggestion. Anything already in the
/// query is skipped.
pub fn derive_suggestions(documents: &[&Document], query: &NormalizedQuery, max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }

    let query_text = query.canonical.to_lowercase();
    let in_query = |candidate: &str| {
        let lowered = candidate.to_lowercase();
        query_text.contains(&lowered) || query.terms.iter().any(|t| t.eq_ignore_ascii_case(&lowered))
    };

    let mut counts: AHashMap<String, (String, usize)> = AHashMap::new();
    for document in documents {
        for term in document.subject_terms() {
            let entry = counts.entry(term.to_lowercase()).or_insert((term.clone(), 0));
            entry.1 += 1;
        }
    }
    let mut subjects: Vec<(String, usize)> = counts.into_values().collect();
    subjects.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase())));

    let mut suggestions: Vec<String> = Vec::new();
    let push = |candidate: String, suggestions: &mut Vec<String>| {
        if suggestions.len() < max
            && !in_query(&candidate)
            && !suggestions.iter().any(|s| s.eq_ignore_ascii_case(&candidate))
        {
            suggestions.push(candidate);
        }
    };

    for (term, _) in subjects {
        push(term, &mut suggestions);
    }

    for document in documents {
        for word in document.title.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.chars().count() > 4 && !TITLE_STOP_WORDS.contains(&word.as_str()) {
                push(word, &mut suggestions);
            }
        }
    }

    let has_orders = documents
        .iter()
        .any(|d| d.document_type == DocumentType::ExecutiveOrder);
    push("congressional bills".to_string(), &mut suggestions);
    if has_orders {
        push("executive orders".to_string(), &mut suggestions);
    }

    suggestions
}
