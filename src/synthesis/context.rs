//! Bounded generation context and prompt

use super::SynthesisInput;
use crate::corpus::Document;
use crate::query::QueryIntent;

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}

/// One numbered document block
pub fn format_document(position: usize, document: &Document, summary_chars: usize) -> String {
    let mut block = format!(
        "Document {}:\nID: {}\nTitle: {}\nType: {}\nStatus: {}\n",
        position,
        document.identifier,
        document.title,
        document.document_type.as_str(),
        if document.status.is_empty() { "unknown" } else { &document.status },
    );

    if let Some(sponsor) = &document.sponsor {
        block.push_str(&format!("Sponsor: {}\n", sponsor.label()));
    }
    if let Some(date) = document.introduced_date {
        block.push_str(&format!("Introduced: {}\n", date));
    }
    if !document.summary.trim().is_empty() {
        block.push_str(&format!(
            "Summary: {}\n",
            truncate_chars(&document.summary, summary_chars)
        ));
    }

    block
}

pub fn build_context(documents: &[&Document], summary_chars: usize) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format_document(i + 1, doc, summary_chars))
        .collect::<Vec<_>>()
        .join("\n")
}

fn intent_guidance(intent: QueryIntent) -> &'static str {
    match intent {
        QueryIntent::Provisions => "Focus on what the documents actually require or contain.",
        QueryIntent::Impact => "Focus on who is affected and how.",
        QueryIntent::Status => "Focus on each document's current legislative status.",
        QueryIntent::Sponsor => "Focus on who sponsored or issued each document.",
        QueryIntent::Overview => "Give a short overview of each relevant document.",
    }
}

/// Full prompt for the generative service
pub fn build_prompt(input: &SynthesisInput<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are helping a member of the public understand U.S. legislation.\n");
    prompt.push_str(&format!("Question: {}\n\n", input.query.raw));
    prompt.push_str("Relevant documents:\n\n");
    prompt.push_str(&build_context(&input.documents, input.summary_chars));
    prompt.push_str("\nInstructions:\n");
    prompt.push_str("- Answer in plain language using only the documents above.\n");
    prompt.push_str("- Cite document IDs (for example HR-1234) for every claim.\n");
    prompt.push_str("- Stay neutral; do not speculate about motives or outcomes.\n");
    if input.incomplete {
        prompt.push_str("- Only a few matching documents were found; say that the results may be incomplete.\n");
    } else {
        prompt.push_str("- If the documents do not fully answer the question, say so.\n");
    }
    for intent in &input.query.intents {
        prompt.push_str(&format!("- {}\n", intent_guidance(*intent)));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::doc;
    use crate::corpus::Sponsor;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("défense budget", 7), "défense...");
        assert_eq!(truncate_chars("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_document_block_fields() {
        let mut d = doc("HR-1-119", "One Big Beautiful Bill Act");
        d.summary = "x".repeat(500);
        d.sponsor = Some(Sponsor {
            full_name: "Jodey Arrington".to_string(),
            party: Some("R".to_string()),
            state: Some("TX".to_string()),
        });

        let block = format_document(1, &d, 400);
        assert!(block.starts_with("Document 1:\nID: HR-1-119\n"));
        assert!(block.contains("Sponsor: Jodey Arrington (R-TX)"));
        assert!(block.contains(&format!("Summary: {}...", "x".repeat(400))));
    }
}
