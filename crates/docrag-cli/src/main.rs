//! DocRAG CLI - Ask questions about a folder of documents

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// DocRAG - Ask questions about a folder of documents
#[derive(Parser)]
#[command(name = "docrag")]
#[command(version)]
#[command(about = "Retrieval-augmented question answering over a folder of documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize DocRAG (create config, documents folder and index)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Ingest every document under the documents folder
    Scan,

    /// Ingest a single file from the documents folder
    Ingest {
        /// Path to the file
        path: String,
    },

    /// Copy a file into the documents folder under a topic and ingest it
    Upload {
        /// Local file to upload
        file: String,

        /// Topic (sub-folder) to file it under
        #[arg(short, long, default_value = "general")]
        topic: String,
    },

    /// Ask a question about the ingested documents
    Ask {
        /// Your question
        question: String,

        /// Only use documents from this topic
        #[arg(short, long)]
        topic: Option<String>,

        /// Hide source excerpts
        #[arg(long)]
        no_sources: bool,
    },

    /// Show index health and Ollama status
    Status,

    /// Scan, then watch the documents folder and ingest new files (foreground)
    Watch,

    /// Start an interactive shell with the watcher running in the background
    Shell,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrag=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrag=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
        },
        Commands::Scan => commands::scan::run(),
        Commands::Ingest { path } => commands::ingest::run(&path),
        Commands::Upload { file, topic } => commands::upload::run(&file, &topic),
        Commands::Ask {
            question,
            topic,
            no_sources,
        } => commands::ask::run(&question, topic.as_deref(), !no_sources),
        Commands::Status => commands::status::run(),
        Commands::Watch => commands::watch::run(),
        Commands::Shell => commands::shell::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
