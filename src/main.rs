//! # DocSphere — Document Q&A Service
//!
//! Per-user embedding store with hybrid ranked retrieval.
//!
//! Usage:
//!   docsphere serve                          # Start the HTTP gateway
//!   docsphere ingest report.pdf --user bob   # Ingest a document from disk
//!   docsphere ask "what is the policy?"      # Ask against your documents

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docsphere_agent::{DEFAULT_TOP_K, DocBot};
use docsphere_core::config::DocSphereConfig;
use docsphere_store::{DocumentSource, IngestionPipeline, PersistentStore, QueryEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docsphere",
    version,
    about = "📚 DocSphere — document Q&A with hybrid ranked retrieval"
)]
struct Cli {
    /// Config file path (default: ~/.docsphere/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve,
    /// Ingest a document from disk
    Ingest {
        /// Path of the file to ingest
        file: std::path::PathBuf,
        /// Owner namespace for the document
        #[arg(short, long, default_value = "default")]
        user: String,
        /// Media type override (otherwise guessed from extension/content)
        #[arg(short, long)]
        mime: Option<String>,
    },
    /// Ask a question against ingested documents
    Ask {
        question: String,
        /// Owner namespace to search
        #[arg(short, long, default_value = "default")]
        user: String,
        /// Number of pages to retrieve
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "docsphere=debug,tower_http=debug"
    } else {
        "docsphere=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => DocSphereConfig::load_from(path)?,
        None => DocSphereConfig::load()?,
    };

    let store = Arc::new(PersistentStore::open(config.store.resolved_path())?);
    let embedder = docsphere_providers::create_embedder(&config)?;

    match cli.command {
        Command::Serve => {
            let ocr = docsphere_providers::create_ocr(&config)?;
            let completion = docsphere_providers::create_completion(&config)?;
            let pipeline = Arc::new(IngestionPipeline::new(
                ocr,
                embedder.clone(),
                store.clone(),
                config.store.accept_plain_text,
            ));
            let query = Arc::new(QueryEngine::new(embedder, store));
            let bot = Arc::new(DocBot::new(completion, query));
            docsphere_gateway::start(&config.gateway, pipeline, bot).await?;
        }
        Command::Ingest { file, user, mime } => {
            let ocr = docsphere_providers::create_ocr(&config)?;
            let pipeline = IngestionPipeline::new(
                ocr,
                embedder,
                store,
                config.store.accept_plain_text,
            );
            let doc_id = pipeline
                .ingest(&user, DocumentSource::path(&file), mime.as_deref())
                .await?;
            println!("✅ Ingested {} as {doc_id}", file.display());
        }
        Command::Ask { question, user, k } => {
            let completion = docsphere_providers::create_completion(&config)?;
            let query = Arc::new(QueryEngine::new(embedder, store));
            let bot = DocBot::new(completion, query);
            let answer = bot.answer(&user, &question, k).await?;
            println!("{}", answer.answer);
            if !answer.references.is_empty() {
                println!("\nReferences:");
                for r in &answer.references {
                    println!("  {} (page {})", r.link, r.page_no);
                }
            }
        }
    }

    Ok(())
}
