//! docrag command line interface.

mod config;
mod extract;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use docrag_core::{
    ChunkConfig, ChunkStore, DocumentStore, EmbeddingProvider, Error, TextExtractor, VectorIndex,
};
use docrag_embed::{EmbedderPool, HashEmbedder};
use docrag_gemini::{GeminiChat, GeminiClient, GeminiEmbedder};
use docrag_index::{FlatIndex, MemoryIndex};
use docrag_pipeline::{DeletionPipeline, DocumentLocks, IngestionPipeline};
use docrag_query::{MemoryUserDirectory, QueryRouter, Retriever, ToolInvocation};
use docrag_store::{FileChunkStore, FileDocumentStore};

use config::Config;
use extract::PlainTextExtractor;

const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser)]
#[command(name = "docrag", about = "Document ingestion and retrieval-augmented chat")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a text or markdown file
    Ingest {
        /// File to ingest
        file: PathBuf,
    },
    /// List ingested documents
    List,
    /// Delete a document and everything derived from it
    Delete {
        /// Document id
        id: Uuid,
    },
    /// Retrieve the chunks most relevant to a query
    Query {
        query: String,
        /// How many chunks to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ask the chat model, with tools and retrieved context
    Chat { prompt: String },
    /// Show store and index statistics
    Status,
    /// Print a sample configuration file
    Config,
}

struct App {
    config: Config,
    documents: Arc<dyn DocumentStore>,
    chunks: Arc<dyn ChunkStore>,
    index: Arc<dyn VectorIndex>,
    pool: Arc<EmbedderPool>,
    ingest: IngestionPipeline,
    delete: DeletionPipeline,
    retriever: Arc<Retriever>,
}

impl App {
    async fn build(config: Config) -> anyhow::Result<Self> {
        let data_dir = config.data_dir()?;
        let dimension = config.index.dimension;

        let index: Arc<dyn VectorIndex> = match config.index.backend.as_str() {
            "flat" => Arc::new(FlatIndex::open(data_dir.join("index.json"), dimension).await?),
            "memory" => Arc::new(MemoryIndex::new(dimension)),
            other => bail!("unknown index backend {other:?} (expected \"flat\" or \"memory\")"),
        };

        let documents: Arc<dyn DocumentStore> =
            Arc::new(FileDocumentStore::open(data_dir.join("documents.json")).await?);
        let chunks: Arc<dyn ChunkStore> =
            Arc::new(FileChunkStore::open(data_dir.join("chunks.json")).await?);

        let provider: Arc<dyn EmbeddingProvider> = match config.embedding.provider.as_str() {
            "hash" => Arc::new(HashEmbedder::new(dimension)),
            "gemini" => match std::env::var(API_KEY_ENV) {
                Ok(key) => {
                    let embedder = GeminiEmbedder::new(GeminiClient::new(key).map_err(Error::from)?);
                    if embedder.dimension() != dimension {
                        bail!(
                            "index dimension {} does not match the {} model ({})",
                            dimension,
                            embedder.model_name(),
                            embedder.dimension()
                        );
                    }
                    Arc::new(embedder)
                }
                Err(_) => {
                    warn!("{API_KEY_ENV} not set, using the local hash embedder");
                    Arc::new(HashEmbedder::new(dimension))
                }
            },
            other => bail!("unknown embedding provider {other:?} (expected \"gemini\" or \"hash\")"),
        };
        let pool = Arc::new(EmbedderPool::new(provider, config.embedding.max_concurrent));

        let locks = Arc::new(DocumentLocks::new());
        let ingest = IngestionPipeline::new(
            pool.clone(),
            index.clone(),
            chunks.clone(),
            documents.clone(),
            locks.clone(),
            ChunkConfig {
                size: config.chunking.size,
                overlap: config.chunking.overlap,
            },
        );
        let delete = DeletionPipeline::new(
            index.clone(),
            chunks.clone(),
            documents.clone(),
            locks,
        );
        let retriever = Arc::new(Retriever::new(pool.clone(), index.clone(), chunks.clone()));

        Ok(Self {
            config,
            documents,
            chunks,
            index,
            pool,
            ingest,
            delete,
            retriever,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("docrag=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Command::Config = cli.command {
        print!("{}", Config::sample_toml());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let app = App::build(config).await?;

    match cli.command {
        Command::Config => unreachable!(),
        Command::Ingest { file } => ingest_file(&app, &file, cli.format).await,
        Command::List => list_documents(&app, cli.format).await,
        Command::Delete { id } => delete_document(&app, id, cli.format).await,
        Command::Query { query, top_k } => {
            let top_k = top_k.unwrap_or(app.config.retrieval.top_k);
            run_query(&app, &query, top_k, cli.format).await
        }
        Command::Chat { prompt } => run_chat(&app, &prompt).await,
        Command::Status => show_status(&app, cli.format).await,
    }
}

async fn ingest_file(app: &App, file: &PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let mime = mime_guess::from_path(file)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let extractor = PlainTextExtractor;
    let text = extractor.extract(&bytes, &mime).await.map_err(Error::from)?;

    let (record, count) = app
        .ingest
        .ingest_document(&filename, bytes.len() as u64, &text)
        .await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "document": record, "chunks": count })
        ),
        OutputFormat::Text => {
            println!("Ingested {} as {} ({count} chunks)", filename, record.id);
        }
    }
    Ok(())
}

async fn list_documents(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    let documents = app.documents.list().await.map_err(Error::from)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&documents)?),
        OutputFormat::Text => {
            if documents.is_empty() {
                println!("No documents ingested.");
            }
            for doc in documents {
                println!(
                    "{}  {}  {} bytes  {}",
                    doc.id,
                    doc.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                    doc.size_bytes,
                    doc.filename
                );
            }
        }
    }
    Ok(())
}

async fn delete_document(app: &App, id: Uuid, format: OutputFormat) -> anyhow::Result<()> {
    match app.delete.delete_document(id).await {
        Ok(report) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
                OutputFormat::Text => println!(
                    "Deleted {id}: {} vectors, {} chunks",
                    report.vectors_removed, report.chunks_removed
                ),
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => bail!("Document not found: {id}"),
        Err(e) => Err(e.into()),
    }
}

async fn run_query(
    app: &App,
    query: &str,
    top_k: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let chunks = app.retriever.retrieve(query, top_k).await;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chunks)?),
        OutputFormat::Text => {
            if chunks.is_empty() {
                println!("No matching chunks.");
            }
            for (i, chunk) in chunks.iter().enumerate() {
                println!("--- {} ---\n{}", i + 1, chunk);
            }
        }
    }
    Ok(())
}

async fn run_chat(app: &App, prompt: &str) -> anyhow::Result<()> {
    let key = std::env::var(API_KEY_ENV)
        .with_context(|| format!("chat needs {API_KEY_ENV} to be set"))?;
    let client = GeminiClient::new(key).map_err(Error::from)?;
    let model = Arc::new(GeminiChat::new(client).with_tools(ToolInvocation::declarations()));
    let router = QueryRouter::new(
        model,
        Arc::new(MemoryUserDirectory::new()),
        app.retriever.clone(),
        app.config.retrieval.top_k,
    );

    let reply = router.answer(prompt).await?;
    println!("{reply}");
    Ok(())
}

async fn show_status(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    let documents = app.documents.list().await.map_err(Error::from)?;
    let vectors = app.index.len().await;
    let mut chunk_count = 0u64;
    for doc in &documents {
        chunk_count += app
            .chunks
            .find_by_document(doc.id)
            .await
            .map_err(Error::from)?
            .len() as u64;
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "documents": documents.len(),
                "chunks": chunk_count,
                "vectors": vectors,
                "index_backend": app.config.index.backend,
                "dimension": app.config.index.dimension,
                "embedder": app.pool.model_name(),
            })
        ),
        OutputFormat::Text => {
            println!("documents: {}", documents.len());
            println!("chunks:    {chunk_count}");
            println!("vectors:   {vectors}");
            println!(
                "index:     {} ({}d)",
                app.config.index.backend, app.config.index.dimension
            );
            println!("embedder:  {}", app.pool.model_name());
        }
    }
    Ok(())
}
