//! Table-driven rewriting of bill and order references
//!
//! Every rule turns whatever spelling a user typed ("hr 1234", "H.R.1234",
//! "house bill 1234") into one canonical token `PREFIX-<number>[-<congress>]`.
//! Rules run in table order, so more specific prefixes (joint resolutions)
//! must come before the shorter ones that would otherwise swallow them.

use crate::config::IdentifierRuleConfig;
use crate::error::{CivicError, Result};
use regex::{Captures, Regex};

/// A reference starts the text or follows whitespace or opening punctuation,
/// never a letter or an apostrophe ("Trump's 2 orders" is not `S-2`)
const LEAD: &str = r#"(?P<lead>^|[\s(\[{",;:/])"#;

/// Trailing congress suffix shared by the legislative rules
const CONGRESS_SUFFIX: &str = r"(?:\s*-\s*(?P<congress>\d{2,3}))?\b";

/// Built-in rule table
pub fn default_identifier_rules() -> Vec<IdentifierRuleConfig> {
    let legislative = |prefix: &str, body: &str| {
        IdentifierRuleConfig::new(
            prefix,
            format!(
                r"(?i){}(?:{})\s*-?\s*(?P<number>\d+){}",
                LEAD, body, CONGRESS_SUFFIX
            ),
        )
    };

    vec![
        legislative("HJRES", r"h\.?\s*j\.?\s*res\.?"),
        legislative("SJRES", r"s\.?\s*j\.?\s*res\.?"),
        legislative("HRES", r"h\.?\s*res\.?|house\s+resolution"),
        legislative("SRES", r"s\.?\s*res\.?|senate\s+resolution"),
        legislative("HR", r"h\.?\s*r\.?|house\s+bill"),
        legislative("S", r"s\.?|senate\s+bill"),
        IdentifierRuleConfig::new(
            "EO",
            format!(
                r"(?i){}(?:e\.?\s*o\.?|executive\s+order)\s*(?:no\.?\s*)?-?\s*(?P<number>\d+)\b",
                LEAD
            ),
        ),
    ]
}

/// One compiled rewrite rule
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    prefix: String,
    regex: Regex,
    /// Pattern uses `number`/`congress` names rather than groups 1 and 2
    named: bool,
}

impl IdentifierRule {
    pub fn new(prefix: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            CivicError::Config(format!("Invalid identifier pattern for {}: {}", prefix, e))
        })?;

        let named = regex.capture_names().any(|name| name == Some("number"));

        Ok(Self {
            prefix: prefix.to_uppercase(),
            regex,
            named,
        })
    }

    fn canonical(&self, caps: &Captures<'_>) -> String {
        let (number, congress) = if self.named {
            (caps.name("number"), caps.name("congress"))
        } else {
            (caps.get(1), caps.get(2))
        };
        let number = number.map(|m| m.as_str()).unwrap_or_default();
        match congress {
            Some(congress) => format!("{}-{}-{}", self.prefix, number, congress.as_str()),
            None => format!("{}-{}", self.prefix, number),
        }
    }
}

/// Ordered identifier rewrite table
#[derive(Debug, Clone)]
pub struct IdentifierTable {
    rules: Vec<IdentifierRule>,
}

impl IdentifierTable {
    pub fn from_config(rules: &[IdentifierRuleConfig]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|r| IdentifierRule::new(&r.prefix, &r.pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Rewrite every reference in `text`, returning the new text and the
    /// canonical identifiers produced
    pub fn rewrite(&self, text: &str) -> (String, Vec<String>) {
        let mut current = text.to_string();
        let mut found = Vec::new();

        for rule in &self.rules {
            let rewritten = rule.regex.replace_all(&current, |caps: &Captures<'_>| {
                let canonical = rule.canonical(caps);
                let lead = caps.name("lead").map_or("", |m| m.as_str());
                let replacement = format!("{}{}", lead, canonical);
                found.push(canonical);
                replacement
            });
            current = rewritten.into_owned();
        }

        (current, found)
    }

    /// Canonical form of a lone identifier such as "h.r. 1234"
    pub fn canonicalize(&self, text: &str) -> Option<String> {
        let (rewritten, found) = self.rewrite(text.trim());
        match found.as_slice() {
            [only] if rewritten == *only => Some(only.clone()),
            _ => None,
        }
    }
}

impl Default for IdentifierTable {
    fn default() -> Self {
        // The built-in patterns are fixed literals
        Self::from_config(&default_identifier_rules()).unwrap_or(Self { rules: Vec::new() })
    }
}
