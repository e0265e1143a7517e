//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod ingest;
pub mod init;
pub mod scan;
pub mod shell;
pub mod status;
pub mod upload;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;
use docrag_config::{AppPaths, Config};
use docrag_core::{Answer, IngestOutcome};
use docrag_db::{Database, SqliteVectorIndex};
use docrag_ingest::{
    ChunkConfig, ChunkSplitter, DocumentRepository, FileExtractor, Ingestor, PathWatcher,
    WatcherConfig,
};
use docrag_ollama::{OllamaService, RagConfig, RetrievalAssembler};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load and validate the configuration file (defaults when absent).
pub fn load_config(paths: &AppPaths) -> Result<Config> {
    let config = Config::load_from(&paths.config_file).context("Failed to load config")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Every component of the pipeline, wired from configuration.
pub struct Pipeline {
    pub config: Config,
    pub paths: AppPaths,
    pub database: Database,
    pub service: Arc<OllamaService>,
    pub ingestor: Arc<Ingestor>,
    pub assembler: RetrievalAssembler,
    watch: WatcherConfig,
}

impl Pipeline {
    /// Build the pipeline, creating the documents root if it is missing.
    pub fn open() -> Result<Self> {
        let paths = get_paths()?;
        let config = load_config(&paths)?;

        let root = config
            .documents_root()
            .context("Failed to resolve documents folder")?;
        if !root.exists() {
            std::fs::create_dir_all(&root)
                .with_context(|| format!("Failed to create documents folder {}", root.display()))?;
            info!("Created documents folder {}", root.display());
        }

        let database = Database::open(&paths.index_file).context("Failed to open index")?;
        let service = Arc::new(
            OllamaService::from_config(&config.ollama).context("Failed to set up Ollama client")?,
        );
        let index = Arc::new(SqliteVectorIndex::new(database.clone(), service.clone()));

        let splitter = ChunkSplitter::new(ChunkConfig::from_processing_config(&config.processing))
            .context("Invalid chunking configuration")?;
        let watch = WatcherConfig::from_config(root.clone(), &config.watch);
        let ingestor = Arc::new(
            Ingestor::new(
                root,
                Arc::new(DocumentRepository::new()),
                Arc::new(FileExtractor::new()),
                index.clone(),
                splitter,
            )
            .with_ignore_patterns(watch.ignore_patterns.clone()),
        );

        let assembler = RetrievalAssembler::new(
            index,
            service.clone(),
            RagConfig::from_config(&config.retrieval),
        );

        Ok(Self {
            config,
            paths,
            database,
            service,
            ingestor,
            assembler,
            watch,
        })
    }

    pub fn root(&self) -> PathBuf {
        self.ingestor.root().to_path_buf()
    }

    /// Start the watcher and a consumer thread that ingests what it reports.
    pub fn start_watching(&self) -> Result<(PathWatcher, JoinHandle<usize>)> {
        let (tx, rx) = channel();
        let mut watcher = PathWatcher::new(self.watch.clone());
        watcher.start(tx).context("Failed to start watcher")?;

        let ingestor = Arc::clone(&self.ingestor);
        let consumer = std::thread::Builder::new()
            .name("docrag-ingest".to_string())
            .spawn(move || ingestor.run_watch_queue(rx))
            .context("Failed to start ingestion thread")?;

        Ok((watcher, consumer))
    }

    /// Warn early when the Ollama server cannot be reached.
    pub fn check_ollama(&self) -> bool {
        if self.service.is_available() {
            return true;
        }
        println!(
            "{} Ollama is not reachable at {}. Indexing and answers will fail until it is running.",
            "Warning:".yellow().bold(),
            self.service.client().host()
        );
        false
    }
}

/// One-line description of an ingestion outcome.
pub fn describe_outcome(outcome: &IngestOutcome) -> String {
    match outcome {
        IngestOutcome::Ingested(record) => format!(
            "{} {} (topic: {}, {})",
            "Ingested:".green().bold(),
            record.file_name,
            record.topic.cyan(),
            format_size(record.size_bytes)
        ),
        IngestOutcome::Skipped(reason) => format!("{} {}", "Skipped:".yellow().bold(), reason),
    }
}

/// Print an answer and, optionally, its source excerpts.
pub fn print_answer(answer: &Answer, show_sources: bool) {
    println!();
    println!("{}", "Answer:".green().bold());
    println!();
    println!("{}", answer.answer);
    println!();

    if let Some(topic) = &answer.applied_filter {
        println!("{} {}", "Topic:".dimmed(), topic.cyan());
    }

    if show_sources && !answer.sources.is_empty() {
        println!("{}", "─".repeat(70));
        println!("{}", "Sources:".cyan().bold());
        for (i, source) in answer.sources.iter().enumerate() {
            println!(
                "  {}. {}",
                (i + 1).to_string().yellow(),
                source.source_file.white().bold()
            );
            println!("     {}", source.excerpt.dimmed());
        }
        println!();
    }
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
