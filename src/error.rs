use crate::embedding::{KeywordIndexError, VectorIndexError};
use crate::retrieval::{StrategyFailure, StrategyKind};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for civiclens
///
/// Only `InvalidQuery` and `AllStrategiesUnavailable` ever reach a caller from
/// the query path. Everything else is configuration or corpus loading.
#[derive(Error, Debug)]
pub enum CivicError {
    /// Query rejected before any strategy ran
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),

    /// Every retrieval strategy failed for the same query
    #[error("All retrieval strategies are unavailable: {failures:?}")]
    AllStrategiesUnavailable {
        failures: Vec<(StrategyKind, StrategyFailure)>,
    },

    /// Embedding of a different dimensionality than the corpus
    #[error("Embedding dimension mismatch for {document_id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        document_id: String,
        expected: usize,
        actual: usize,
    },

    /// Corpus content that cannot be served
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Keyword index construction errors
    #[error("Keyword index error: {0}")]
    Index(#[from] KeywordIndexError),

    /// Vector candidate index construction errors
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CivicError {
    /// Whether the error is the caller's fault (malformed input)
    pub fn is_client_error(&self) -> bool {
        matches!(self, CivicError::InvalidQuery(_))
    }
}

/// Reason a raw query was refused by the normalizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryRejection {
    #[error("query is empty")]
    Empty,

    #[error("query is {length} characters long, the maximum is {max}")]
    TooLong { length: usize, max: usize },

    #[error("query contains a blocked pattern: {pattern}")]
    Blocked { pattern: String },
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for civiclens operations
pub type Result<T> = std::result::Result<T, CivicError>;
