//! Deterministic answer built from document metadata alone

use super::context::truncate_chars;
use super::SynthesisInput;
use crate::corpus::{Document, DocumentType};
use crate::query::QueryIntent;

const KEY_FINDINGS: usize = 3;
const EXCERPT_CHARS: usize = 240;

/// Compose the fallback answer. Always cites identifiers and never fails.
pub fn compose(input: &SynthesisInput<'_>) -> String {
    let documents = &input.documents;
    let Some(top) = documents.first() else {
        return no_results_text(&input.query.raw);
    };

    let mut lines = Vec::new();

    let noun = if input.total_matches == 1 { "document" } else { "documents" };
    lines.push(format!(
        "Found {} relevant {} for \"{}\".",
        input.total_matches, noun, input.query.raw
    ));

    if let Some(breakdown) = type_breakdown(documents) {
        lines.push(format!("The top results include {}.", breakdown));
    }

    lines.push(format!(
        "The most relevant is {}: {}.",
        top.identifier,
        top.title.trim_end_matches('.')
    ));

    lines.push(String::new());
    lines.push("Key findings:".to_string());
    for document in documents.iter().take(KEY_FINDINGS) {
        lines.push(format!(
            "- {}: {} (status: {})",
            document.identifier,
            document.title,
            status_label(document)
        ));
    }

    if let Some(line) = intent_line(input) {
        lines.push(String::new());
        lines.push(line);
    }

    if input.incomplete {
        lines.push(String::new());
        lines.push(
            "Only a few documents matched, so these results may be incomplete. Try a broader query or a bill number."
                .to_string(),
        );
    }

    lines.join("\n")
}

pub fn no_results_text(query: &str) -> String {
    format!(
        "No documents matched \"{}\". Try a bill number such as HR-1234, a sponsor's name, or broader topic words.",
        query
    )
}

fn status_label(document: &Document) -> &str {
    if document.status.trim().is_empty() {
        "unknown"
    } else {
        document.status.trim()
    }
}

/// "2 congressional bills and 1 executive order"
fn type_breakdown(documents: &[&Document]) -> Option<String> {
    let parts: Vec<String> = [DocumentType::Bill, DocumentType::ExecutiveOrder, DocumentType::Other]
        .iter()
        .filter_map(|kind| {
            let count = documents.iter().filter(|d| d.document_type == *kind).count();
            (count > 0).then(|| format!("{} {}", count, kind.plural_label(count)))
        })
        .collect();

    match parts.len() {
        0 => None,
        1 => Some(parts[0].clone()),
        n => Some(format!("{} and {}", parts[..n - 1].join(", "), parts[n - 1])),
    }
}

fn intent_line(input: &SynthesisInput<'_>) -> Option<String> {
    let query = input.query;
    let top_three = input.documents.iter().take(KEY_FINDINGS);

    if query.has_intent(QueryIntent::Sponsor) {
        let sponsors: Vec<String> = top_three
            .filter_map(|d| d.sponsor.as_ref().map(|s| format!("{} by {}", d.identifier, s.label())))
            .collect();
        if !sponsors.is_empty() {
            return Some(format!("Sponsors: {}.", sponsors.join("; ")));
        }
        return None;
    }

    if query.has_intent(QueryIntent::Status) {
        let statuses: Vec<String> = top_three
            .map(|d| format!("{} is {}", d.identifier, status_label(d)))
            .collect();
        return Some(format!("Current status: {}.", statuses.join("; ")));
    }

    let top = input.documents.first()?;
    if top.summary.trim().is_empty() {
        return None;
    }
    Some(format!(
        "Summary of {}: {}",
        top.identifier,
        truncate_chars(&top.summary, EXCERPT_CHARS.min(input.summary_chars))
    ))
}
