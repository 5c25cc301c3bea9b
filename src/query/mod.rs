//! Query normalization
//!
//! Turns raw user text into a [`NormalizedQuery`]. Pure and deterministic:
//! no I/O, and the same input always yields the same output.

mod identifiers;

pub use identifiers::{default_identifier_rules, IdentifierRule, IdentifierTable};

use crate::config::QueryConfig;
use crate::error::{CivicError, QueryRejection, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// Hint about what the user wants to know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Provisions,
    Impact,
    Status,
    Sponsor,
    Overview,
}

const INTENT_CUES: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::Provisions,
        &["provision", "what does", "contain", "include", "section", "requirement"],
    ),
    (
        QueryIntent::Impact,
        &["impact", "affect", "effect", "mean for", "consequence", "cost"],
    ),
    (
        QueryIntent::Status,
        &["status", "passed", "signed", "vote", "enacted", "where is", "became law"],
    ),
    (
        QueryIntent::Sponsor,
        &["sponsor", "who introduced", "introduced by", "author", "who wrote"],
    ),
    (QueryIntent::Overview, &["overview", "summary", "summarize", "about"]),
];

/// Structured form of a user query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedQuery {
    /// Trimmed original text, kept for display
    pub raw: String,
    /// Terms joined with single spaces
    pub canonical: String,
    /// Effective search phrase (conversational wrapper and edge stop words removed)
    pub phrase: String,
    pub terms: Vec<String>,
    pub key_phrases: Vec<String>,
    /// Canonical identifiers mentioned in the query, in order of appearance
    pub identifiers: Vec<String>,
    pub intents: Vec<QueryIntent>,
    pub conversational: bool,
}

impl NormalizedQuery {
    /// Text handed to the embedder
    pub fn effective_text(&self) -> &str {
        if self.phrase.is_empty() {
            &self.canonical
        } else {
            &self.phrase
        }
    }

    pub fn phrase_token_count(&self) -> usize {
        self.phrase.split_whitespace().count()
    }

    pub fn has_intent(&self, intent: QueryIntent) -> bool {
        self.intents.contains(&intent)
    }
}

const CONVERSATIONAL_PATTERN: &str = r"(?is)^\s*(?:(?:can|could)\s+you\s+|please\s+)?(?:what\s+can\s+you\s+tell\s+me\s+about|tell\s+me\s+(?:more\s+)?about|what\s+do\s+you\s+know\s+about|i\s+want\s+to\s+know\s+about|(?:give\s+me\s+)?information\s+(?:on|about)|what\s+(?:is|are|was|were)|what's|who\s+(?:is|are)|explain|describe|summari[sz]e|show\s+me|find\s+me|search\s+for|look\s+up)\s+(.+)$";

const QUOTED_PATTERN: &str = r#""([^"]+)"|\x{201C}([^\x{201D}]+)\x{201D}"#;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| CivicError::Config(format!("Invalid normalizer pattern: {}", e)))
}

/// Canonicalizes raw query text
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    max_length: usize,
    min_terms: usize,
    stop_words: HashSet<String>,
    blocked_patterns: Vec<String>,
    identifiers: IdentifierTable,
    conversational: Regex,
    quoted: Regex,
}

impl QueryNormalizer {
    pub fn new(config: &QueryConfig) -> Result<Self> {
        Ok(Self {
            max_length: config.max_length,
            min_terms: config.min_terms_after_stopwords.max(1),
            stop_words: config.stop_words.iter().map(|w| w.to_lowercase()).collect(),
            blocked_patterns: config
                .blocked_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            identifiers: IdentifierTable::from_config(&config.identifier_rules)?,
            conversational: compile(CONVERSATIONAL_PATTERN)?,
            quoted: compile(QUOTED_PATTERN)?,
        })
    }

    /// Validate and normalize a raw query
    ///
    /// # Errors
    /// `QueryRejection` when the trimmed text is empty, too long, or contains
    /// a blocked pattern. Nothing downstream runs for a rejected query.
    pub fn normalize(&self, raw: &str) -> std::result::Result<NormalizedQuery, QueryRejection> {
        let trimmed = raw.trim();
        self.check(trimmed)?;

        let (rewritten, found) = self.identifiers.rewrite(trimmed);
        let found: HashSet<String> = found.into_iter().collect();

        let (body, conversational) = match self.conversational.captures(&rewritten) {
            Some(caps) => match caps.get(1) {
                Some(m) => (m.as_str().to_string(), true),
                None => (rewritten.clone(), false),
            },
            None => (rewritten.clone(), false),
        };

        let tokens = tokenize(&body, &found);
        let phrase_tokens = self.trim_edge_stop_words(&tokens);
        if phrase_tokens.is_empty() {
            return Err(QueryRejection::Empty);
        }

        let terms = self.strip_stop_words(phrase_tokens);
        let phrase = phrase_tokens.join(" ");
        let canonical = terms.join(" ");

        let mut identifiers = Vec::new();
        for token in tokenize(&rewritten, &found) {
            if found.contains(&token) && !identifiers.contains(&token) {
                identifiers.push(token);
            }
        }

        let key_phrases = extract_key_phrases(&self.quoted, trimmed, &phrase);
        let intents = detect_intents(trimmed, conversational);

        tracing::debug!(
            "Normalized query '{}' -> '{}' (phrase '{}', {} identifiers)",
            trimmed,
            canonical,
            phrase,
            identifiers.len()
        );

        Ok(NormalizedQuery {
            raw: trimmed.to_string(),
            canonical,
            phrase,
            terms,
            key_phrases,
            identifiers,
            intents,
            conversational,
        })
    }

    pub fn identifier_table(&self) -> &IdentifierTable {
        &self.identifiers
    }

    fn check(&self, trimmed: &str) -> std::result::Result<(), QueryRejection> {
        if trimmed.is_empty() {
            return Err(QueryRejection::Empty);
        }

        let length = trimmed.chars().count();
        if length > self.max_length {
            return Err(QueryRejection::TooLong {
                length,
                max: self.max_length,
            });
        }

        let lowered = trimmed.to_lowercase();
        if let Some(pattern) = self.blocked_patterns.iter().find(|p| lowered.contains(p.as_str())) {
            tracing::warn!("Rejected query containing blocked pattern '{}'", pattern);
            return Err(QueryRejection::Blocked {
                pattern: pattern.clone(),
            });
        }

        Ok(())
    }

    fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    fn trim_edge_stop_words<'a>(&self, tokens: &'a [String]) -> &'a [String] {
        let start = tokens
            .iter()
            .position(|t| !self.is_stop_word(t))
            .unwrap_or(tokens.len());
        let end = tokens
            .iter()
            .rposition(|t| !self.is_stop_word(t))
            .map(|i| i + 1)
            .unwrap_or(start);

        if start >= end {
            // Nothing but stop words: keep them rather than returning an empty query
            tokens
        } else {
            &tokens[start..end]
        }
    }

    fn strip_stop_words(&self, tokens: &[String]) -> Vec<String> {
        let kept: Vec<String> = tokens
            .iter()
            .filter(|t| !self.is_stop_word(t))
            .cloned()
            .collect();

        if kept.len() >= self.min_terms {
            kept
        } else {
            tokens.to_vec()
        }
    }
}

/// Split on whitespace, trim edge punctuation, lowercase everything except
/// canonical identifiers
fn tokenize(text: &str, identifiers: &HashSet<String>) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                None
            } else if identifiers.contains(token) {
                Some(token.to_string())
            } else {
                Some(token.to_lowercase())
            }
        })
        .collect()
}

fn extract_key_phrases(quoted: &Regex, raw: &str, phrase: &str) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();

    for caps in quoted.captures_iter(raw) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            let quoted = m.as_str().trim().to_lowercase();
            if !quoted.is_empty() && !phrases.contains(&quoted) {
                phrases.push(quoted);
            }
        }
    }

    if phrase.split_whitespace().count() >= 2 {
        let lowered = phrase.to_lowercase();
        if !phrases.contains(&lowered) {
            phrases.push(lowered);
        }
    }

    phrases
}

fn detect_intents(raw: &str, conversational: bool) -> Vec<QueryIntent> {
    let padded = format!(
        " {} ",
        raw.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut intents: Vec<QueryIntent> = INTENT_CUES
        .iter()
        .filter(|(_, cues)| cues.iter().any(|cue| padded.contains(&format!(" {}", cue))))
        .map(|(intent, _)| *intent)
        .collect();

    if intents.is_empty() && conversational {
        intents.push(QueryIntent::Overview);
    }

    intents
}
