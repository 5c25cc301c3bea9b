//! Configuration management for civiclens
//!
//! Loads the TOML configuration, applies profile and environment overrides,
//! and validates the result before any component is built from it.

use crate::error::{CivicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub keyword: KeywordConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Where the read-only document snapshot comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSON corpus file (documents + embeddings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// On-disk tantivy index directory; the index lives in RAM when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_index_dir: Option<PathBuf>,
}

/// Request handling limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Deepest page start a request may ask for; larger offsets are clamped
    pub max_offset: usize,
    /// Each strategy fetches `(offset + limit) * search_multiplier` candidates
    pub search_multiplier: usize,
    pub strategy_timeout_ms: u64,
    pub query_deadline_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 50,
            max_offset: 1_000,
            search_multiplier: 3,
            strategy_timeout_ms: 2_000,
            query_deadline_ms: 20_000,
        }
    }
}

/// Identifier rewrite rule: any match of `pattern` becomes `PREFIX-<number>[-<congress>]`
///
/// The pattern captures the number in group 1 and may capture a congress
/// suffix in group 2. Patterns that name a `number` group use the `number` and
/// `congress` names instead, and text captured as `lead` is kept in front of
/// the rewritten token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierRuleConfig {
    pub prefix: String,
    pub pattern: String,
}

impl IdentifierRuleConfig {
    pub fn new(prefix: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            pattern: pattern.into(),
        }
    }
}

/// Query normalizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub max_length: usize,
    /// Stop words are only stripped when at least this many terms remain
    pub min_terms_after_stopwords: usize,
    pub stop_words: Vec<String>,
    pub blocked_patterns: Vec<String>,
    pub identifier_rules: Vec<IdentifierRuleConfig>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let stop_words = [
            "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
            "by", "is", "are", "was", "were", "be", "been", "being", "about", "me", "my", "you",
            "your", "i", "what", "which", "this", "that", "these", "those", "do", "does", "any",
        ];
        let blocked_patterns = [
            "union select",
            "drop table",
            "insert into",
            "delete from",
            "<script",
            "javascript:",
            "onload=",
            "onerror=",
            "../",
            "..\\",
            "/etc/passwd",
            "cmd.exe",
        ];

        Self {
            max_length: 500,
            min_terms_after_stopwords: 1,
            stop_words: stop_words.iter().map(|s| s.to_string()).collect(),
            blocked_patterns: blocked_patterns.iter().map(|s| s.to_string()).collect(),
            identifier_rules: crate::query::default_identifier_rules(),
        }
    }
}

/// Keyword strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Multiplier applied when the title contains the query phrase verbatim
    pub phrase_boost: f64,
    /// Phrases shorter than this never earn the boost
    pub phrase_min_tokens: usize,
    pub title_boost: f32,
    pub summary_boost: f32,
    pub body_boost: f32,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            phrase_boost: 2.0,
            phrase_min_tokens: 2,
            title_boost: 3.0,
            summary_boost: 2.0,
            body_boost: 1.0,
        }
    }
}

/// Semantic strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Similarities below this floor are dropped
    pub min_similarity: f64,
    /// Above this many vectors the HNSW candidate pool replaces the full scan
    pub exact_scan_limit: usize,
    pub candidate_pool: usize,
    pub hnsw_m: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.05,
            exact_scan_limit: 10_000,
            candidate_pool: 200,
            hnsw_m: 16,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 64,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Dimensionality shared by every stored vector and the query embedder
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
        }
    }
}

/// Weighted reciprocal rank fusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// RRF smoothing constant (typically 60)
    pub rrf_k: f64,
    pub keyword_weight: f64,
    pub semantic_weight: f64,
    pub metadata_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            keyword_weight: 0.5,
            semantic_weight: 0.3,
            metadata_weight: 0.2,
        }
    }
}

/// Response synthesizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Number of top documents placed in the generation context
    pub context_documents: usize,
    /// Summary truncation in characters
    pub summary_chars: usize,
    /// Fewer fused matches than this caps the confidence at `sparse_result_cap`
    pub min_match_count: usize,
    pub sparse_result_cap: f64,
    /// Upper bound on confidence for heuristic answers
    pub fallback_ceiling: f64,
    pub max_suggestions: usize,
    pub default_suggestions: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            context_documents: 5,
            summary_chars: 400,
            min_match_count: 3,
            sparse_result_cap: 0.6,
            fallback_ceiling: 0.5,
            max_suggestions: 5,
            default_suggestions: vec![
                "infrastructure bill".to_string(),
                "healthcare legislation".to_string(),
                "defense authorization".to_string(),
                "budget resolution".to_string(),
                "executive orders".to_string(),
            ],
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "anthropic".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_base: None,
            model: "claude-3-5-sonnet-20241022".to_string(),
            temperature: 0.2,
            max_tokens: 1000,
            timeout_ms: 30_000,
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CivicError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CivicError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse, apply environment overrides and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| CivicError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        Ok(config)
    }

    /// Load the file at `path`, or fall back to defaults when it does not exist
    ///
    /// Environment overrides and the profile apply in both cases, and the
    /// result is validated either way.
    pub fn load_or_default(path: &Path, profile: Option<&str>) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::warn!(
                "Config file not found, using defaults. Run 'civiclens config init' to create one."
            );
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        };

        if let Some(profile) = profile {
            config.apply_profile(profile)?;
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| CivicError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(enabled) = overrides.llm_enabled {
            self.llm.enabled = enabled;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: CIVICLENS_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("CIVICLENS_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LLM__ENABLED" => {
                self.llm.enabled = parse_env(path, value)?;
            }
            "LLM__MODEL" => {
                self.llm.model = value.to_string();
            }
            "LLM__PROVIDER" => {
                self.llm.provider = value.to_string();
            }
            "LLM__TIMEOUT_MS" => {
                self.llm.timeout_ms = parse_env(path, value)?;
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "CORPUS__PATH" => {
                self.corpus.path = Some(PathBuf::from(value));
            }
            "FUSION__RRF_K" => {
                self.fusion.rrf_k = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CivicError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("civiclens").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| CivicError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            corpus: CorpusConfig::default(),
            search: SearchConfig::default(),
            query: QueryConfig::default(),
            keyword: KeywordConfig::default(),
            semantic: SemanticConfig::default(),
            embedding: EmbeddingConfig::default(),
            fusion: FusionConfig::default(),
            synthesis: SynthesisConfig::default(),
            llm: LlmConfig::default(),
            profiles: HashMap::new(),
        }
    }
}
