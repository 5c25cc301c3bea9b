use anyhow::{bail, Context};
use civiclens::cli::{Cli, Commands, ConfigAction};
use civiclens::config::Config;
use civiclens::corpus::{Corpus, CorpusFile, DocumentType};
use civiclens::embedding::{
    EmbeddingProvider, EmbeddingStore, FastEmbedProvider, KeywordIndex, TextIndex, VectorStore,
};
use civiclens::query::QueryNormalizer;
use civiclens::retrieval::{HybridSearcher, SearchFilters, SearchRequest, SearchResponse};
use civiclens::synthesis::ResponseSynthesizer;
use civiclens::CivicError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            corpus,
            limit,
            offset,
            document_type,
            status,
            sponsor,
            from,
            to,
            offline,
            json,
        } => {
            let mut config = load_config(cli.config, cli.profile)?;
            if offline {
                config.llm.enabled = false;
            }
            if let Some(path) = corpus {
                config.corpus.path = Some(path);
            }

            let filters = SearchFilters {
                document_type: document_type
                    .map(|t| t.parse::<DocumentType>())
                    .transpose()?,
                status,
                date_from: from,
                date_to: to,
                sponsor,
            };

            let mut request = SearchRequest::new(query).with_filters(filters);
            request.limit = limit;
            request.offset = offset;

            cmd_search(&config, &request, json)?;
        }
        Commands::Normalize { query } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_normalize(&config, &query)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "civiclens=debug" } else { "civiclens=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_search(config: &Config, request: &SearchRequest, json: bool) -> anyhow::Result<()> {
    let searcher = build_searcher(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let response = match runtime.block_on(searcher.search(request)) {
        Ok(response) => response,
        Err(e) if e.is_client_error() => bail!("{}", e),
        Err(e) => return Err(e).context("Search failed"),
    };

    if json {
        let out = serde_json::to_string_pretty(&response).map_err(|e| CivicError::Json {
            source: e,
            context: "Failed to serialize response".to_string(),
        })?;
        println!("{}", out);
    } else {
        print_response(&response);
    }

    Ok(())
}

/// Load the corpus snapshot and wire every collaborator into a searcher
fn build_searcher(config: &Config) -> anyhow::Result<HybridSearcher> {
    let Some(corpus_path) = config.corpus.path.as_deref() else {
        bail!("No corpus configured; pass --corpus FILE or set corpus.path");
    };

    tracing::info!("Loading corpus from {}", corpus_path.display());
    let file = CorpusFile::load(corpus_path)?;
    let mut embeddings = file.current_embeddings(config.embedding.dimension)?;
    let corpus = Arc::new(Corpus::new(file.documents)?);

    let known = corpus.identifiers();
    let before = embeddings.len();
    embeddings.retain(|e| known.contains(e.document_id.as_str()));
    if embeddings.len() < before {
        tracing::warn!(
            "Ignoring {} embeddings for documents missing from the corpus",
            before - embeddings.len()
        );
    }

    tracing::info!(
        "Corpus has {} documents and {} embeddings",
        corpus.len(),
        embeddings.len()
    );

    let embedder = if embeddings.is_empty() {
        tracing::warn!("No document embeddings; semantic search disabled");
        None
    } else {
        load_embedder(&config.embedding.model)
    };

    let store: Arc<dyn VectorStore> = Arc::new(EmbeddingStore::new(
        config.embedding.dimension,
        embeddings,
        &config.semantic,
    )?);

    let keyword_index = match config.corpus.keyword_index_dir.as_deref() {
        Some(dir) => KeywordIndex::open_or_build(&corpus, &expand_path(dir)?, &config.keyword)?,
        None => KeywordIndex::build_in_ram(&corpus, &config.keyword)?,
    };
    let text_index: Arc<dyn TextIndex> = Arc::new(keyword_index);

    let synthesizer = ResponseSynthesizer::from_config(&config.synthesis, &config.llm);

    Ok(HybridSearcher::new(
        config,
        corpus,
        text_index,
        store,
        embedder,
        synthesizer,
    )?)
}

fn load_embedder(model: &str) -> Option<Arc<dyn EmbeddingProvider>> {
    match FastEmbedProvider::new(model) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!("Embedding model unavailable ({}); semantic search disabled", e);
            None
        }
    }
}

fn print_response(response: &SearchResponse) {
    println!("Query: {}", response.query);
    println!(
        "Confidence: {:.2} ({:?}, {:?})",
        response.confidence_score, response.confidence_band, response.synthesis_mode
    );
    println!();
    println!("{}", response.ai_summary);

    if !response.documents.is_empty() {
        println!();
        println!(
            "Documents ({} of {}):",
            response.returned_results, response.total_results
        );
        for doc in &response.documents {
            let matched: Vec<&str> = doc.matched_by.iter().map(|k| k.as_str()).collect();
            println!(
                "{:>3}. {:<14} {}  [{}, {}]  score {:.4} ({})",
                doc.rank,
                doc.identifier,
                doc.title,
                doc.document_type.as_str(),
                if doc.status.is_empty() { "unknown" } else { &doc.status },
                doc.relevance_score,
                matched.join(", ")
            );
        }
    }

    if !response.source_documents.is_empty() {
        println!();
        println!("Sources: {}", response.source_documents.join(", "));
    }

    if !response.suggestions.is_empty() {
        println!("Try also: {}", response.suggestions.join("; "));
    }

    for degraded in &response.degraded_strategies {
        println!("Note: {} search unavailable ({})", degraded.strategy, degraded.reason);
    }

    println!("({}ms)", response.response_time_ms);
}

fn cmd_normalize(config: &Config, query: &str) -> anyhow::Result<()> {
    let normalizer = QueryNormalizer::new(&config.query)?;
    let normalized = normalizer
        .normalize(query)
        .map_err(CivicError::from)?;

    let json = serde_json::to_string_pretty(&normalized).map_err(|e| CivicError::Json {
        source: e,
        context: "Failed to serialize query".to_string(),
    })?;
    println!("{}", json);

    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, profile)?;
            let value = serde_json::to_value(&config).map_err(|e| CivicError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            let shown = match section {
                Some(section) => match value.get(&section) {
                    Some(v) => v.clone(),
                    None => bail!("Unknown configuration section: {}", section),
                },
                None => value,
            };

            let json = serde_json::to_string_pretty(&shown).map_err(|e| CivicError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            if config.llm.enabled && std::env::var(&config.llm.api_key_env).is_err() {
                println!(
                    "  Note: ${} is not set; answers will use document metadata only",
                    config.llm.api_key_env
                );
            }
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CivicError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> anyhow::Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = Config::load_or_default(&path, profile.as_deref())?;

    if let Some(path) = config.corpus.path.take() {
        config.corpus.path = Some(expand_path(&path)?);
    }

    Ok(config)
}

fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(rest))
    } else {
        Ok(path.to_path_buf())
    }
}
