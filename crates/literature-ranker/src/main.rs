//! Literature Ranker - Entry Point
//!
//! Searches and ranks literature from the command line. Results go to stdout,
//! logs to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use literature_ranker::{
    Config, LiteratureSearch,
    embedding::EmbeddingBackend,
    formatters::{format_hierarchy_markdown, format_ranked_json, format_ranked_markdown},
    models::{SubQuestion, SubQuestionMap},
    workflow::{LiteratureNodeOptions, build_hierarchy, search_literature_for_sub_questions},
};

#[derive(Parser, Debug)]
#[command(name = "literature-ranker")]
#[command(about = "Find and rank academic literature for a research question")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Semantic Scholar API key (optional, enables higher rate limits)
    #[arg(long, global = true, env = "SEMANTIC_SCHOLAR_API_KEY")]
    api_key: Option<String>,

    /// Contact address for the CrossRef polite pool
    #[arg(long, global = true, env = "CROSSREF_MAILTO")]
    mailto: Option<String>,

    /// Embedding backend used for relevance scoring
    #[arg(long, global = true)]
    embedding: Option<Backend>,

    /// Output format
    #[arg(long, global = true, default_value = "markdown")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank literature for a single query
    Search {
        /// Research question or keywords
        query: String,

        /// Maximum number of papers to return
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Rank literature for every mapped sub-question in a JSON file
    Questions {
        /// File with `sub_questions` and `mappings` arrays
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable Markdown
    #[default]
    Markdown,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Backend {
    /// Local feature hashing, no model download
    Hashing,
    /// all-MiniLM-L6-v2 (needs the `fastembed` feature)
    Fastembed,
}

impl From<Backend> for EmbeddingBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Hashing => Self::Hashing,
            Backend::Fastembed => Self::FastEmbed,
        }
    }
}

/// Input for the `questions` command.
#[derive(Debug, Deserialize)]
struct QuestionsFile {
    sub_questions: Vec<SubQuestion>,
    #[serde(default)]
    mappings: Vec<SubQuestionMap>,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if cli.api_key.is_some() {
        config.set_api_key(cli.api_key.clone());
    }
    if cli.mailto.is_some() {
        config.crossref_mailto.clone_from(&cli.mailto);
    }
    if let Some(backend) = cli.embedding {
        config.embedding_backend = backend.into();
    }
    Ok(config)
}

async fn run_search(
    search: &LiteratureSearch,
    query: &str,
    limit: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let papers = match search.search(query, limit).await {
        Ok(papers) => papers,
        Err(e) => anyhow::bail!(e.to_user_message()),
    };

    match format {
        OutputFormat::Markdown => println!("{}", format_ranked_markdown(query, &papers)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&format_ranked_json(query, &papers))?);
        }
    }
    Ok(())
}

async fn run_questions(
    search: &LiteratureSearch,
    file: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let input: QuestionsFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid questions file {}", file.display()))?;

    let literature = search_literature_for_sub_questions(
        search,
        &input.sub_questions,
        &input.mappings,
        LiteratureNodeOptions::default(),
    )
    .await;
    let hierarchy = build_hierarchy(&input.sub_questions, &literature);

    match format {
        OutputFormat::Markdown => {
            for entry in &hierarchy {
                println!("{}", format_hierarchy_markdown(entry));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hierarchy)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let config = build_config(&cli)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        embedding = %config.embedding_backend,
        has_api_key = config.has_api_key(),
        "starting literature ranker"
    );

    let search = LiteratureSearch::from_config(&config)?;
    if let Err(e) = search.load_model().await {
        anyhow::bail!(e.to_user_message());
    }

    match &cli.command {
        Command::Search { query, limit } => {
            let limit = limit.unwrap_or(config.default_search_limit);
            run_search(&search, query, limit, cli.format).await
        }
        Command::Questions { file } => run_questions(&search, file, cli.format).await,
    }
}
