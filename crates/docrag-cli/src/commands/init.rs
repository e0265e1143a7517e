//! Initialize DocRAG.

use super::{get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use docrag_config::Config;
use docrag_db::Database;
use docrag_ollama::OllamaService;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} DocRAG is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Index: {}", paths.index_file.display());
        return Ok(());
    }

    println!("{}", "Initializing DocRAG...".cyan().bold());

    paths
        .ensure_dirs()
        .context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    let config = load_config(&paths)?;
    let root = config.documents_root()?;
    std::fs::create_dir_all(&root).context("Failed to create documents folder")?;
    println!(
        "  {} Documents folder: {}",
        "✓".green(),
        root.display()
    );

    let _db = Database::open(&paths.index_file).context("Failed to initialize index")?;
    println!(
        "  {} Created index: {}",
        "✓".green(),
        paths.index_file.display()
    );

    check_models(&config)?;

    println!();
    println!("{}", "DocRAG initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Put documents under {} (one sub-folder per topic)",
        root.display().to_string().cyan()
    );
    println!("  2. Index them: {}", "docrag scan".cyan());
    println!("  3. Ask a question: {}", "docrag ask \"...\"".cyan());

    Ok(())
}

fn check_models(config: &Config) -> Result<()> {
    let service = OllamaService::from_config(&config.ollama)?;

    if !service.is_available() {
        println!(
            "  {} Ollama not reachable at {} (start it with 'ollama serve')",
            "!".yellow(),
            config.ollama.host
        );
        return Ok(());
    }

    for model in [service.model(), service.embedding_model()] {
        match service.has_model(model) {
            Ok(true) => println!("  {} Model available: {}", "✓".green(), model),
            Ok(false) => println!(
                "  {} Model missing: {} (run 'ollama pull {}')",
                "!".yellow(),
                model,
                model
            ),
            Err(e) => println!("  {} Could not list models: {}", "!".yellow(), e),
        }
    }

    Ok(())
}
