//! CivicLens - hybrid retrieval and answer synthesis for legislative documents
//!
//! A query is normalized, ranked independently by keyword, semantic and
//! metadata strategies, merged with weighted Reciprocal Rank Fusion, and
//! answered in plain language, either by an external generative service or
//! by a deterministic summary of document metadata.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod query;
pub mod retrieval;
pub mod synthesis;

pub use error::{CivicError, Result};
