//! CLI command definitions and parsing
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "civiclens",
    version,
    about = "Plain-language search over U.S. bills and executive orders",
    long_about = "CivicLens ranks legislative documents with keyword, semantic and metadata \
                  strategies, fuses the rankings, and answers the question in plain language \
                  with cited document identifiers."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/civiclens/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the corpus and answer the question
    Search {
        /// Search query text
        query: String,

        /// Corpus JSON file (overrides corpus.path)
        #[arg(long, value_name = "FILE")]
        corpus: Option<PathBuf>,

        /// Maximum number of documents to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of documents to skip
        #[arg(long)]
        offset: Option<usize>,

        /// Only this document type (bill, executive_order, other)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        document_type: Option<String>,

        /// Only documents with this status
        #[arg(long)]
        status: Option<String>,

        /// Only documents whose sponsor name contains this text
        #[arg(long)]
        sponsor: Option<String>,

        /// Introduced on or after this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,

        /// Introduced on or before this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,

        /// Never call the generative service
        #[arg(long)]
        offline: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a query is normalized
    Normalize {
        /// Query text
        query: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "civiclens",
            "--profile",
            "offline",
            "search",
            "hr 1234",
            "--type",
            "bill",
            "--from",
            "2025-01-03",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.profile.as_deref(), Some("offline"));
        match cli.command {
            Commands::Search {
                query,
                document_type,
                from,
                json,
                ..
            } => {
                assert_eq!(query, "hr 1234");
                assert_eq!(document_type.as_deref(), Some("bill"));
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 3));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
