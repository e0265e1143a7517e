//! Status command - index health and Ollama reachability.

use super::Pipeline;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn run() -> Result<()> {
    let pipeline = Pipeline::open()?;
    let db = &pipeline.database;

    println!("{}", "DocRAG Status".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Index".white().bold());
    println!("  Path:       {}", pipeline.paths.index_file.display());
    let healthy = db.integrity_check().context("Integrity check failed to run")?;
    if healthy {
        println!("  Integrity:  {}", "ok".green());
    } else {
        println!("  Integrity:  {}", "corrupt".red().bold());
    }
    println!("  Chunks:     {}", db.chunk_count()?);
    println!("  Embeddings: {}", db.embedding_count()?);

    println!();
    println!("{}", "Documents".white().bold());
    println!("  Root:       {}", pipeline.root().display());
    println!(
        "  Chunking:   {} tokens, {} overlap",
        pipeline.config.processing.chunk_size, pipeline.config.processing.chunk_overlap
    );

    println!();
    println!("{}", "Ollama".white().bold());
    println!("  Host:       {}", pipeline.service.client().host());
    if pipeline.service.is_available() {
        println!("  Server:     {}", "running".green());
        for model in [pipeline.service.model(), pipeline.service.embedding_model()] {
            let present = pipeline.service.has_model(model).unwrap_or(false);
            let mark = if present { "✓".green() } else { "✗".red() };
            println!("  {} {}", mark, model);
        }
    } else {
        println!("  Server:     {}", "not reachable".red());
    }

    Ok(())
}
