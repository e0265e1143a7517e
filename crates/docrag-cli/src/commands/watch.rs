//! Watch command implementation.

use super::Pipeline;
use anyhow::Result;
use colored::Colorize;
use tracing::info;

/// Scan the documents folder, then ingest new files as they appear.
pub fn run() -> Result<()> {
    let pipeline = Pipeline::open()?;
    pipeline.check_ollama();

    println!("{}", "Scanning documents folder...".cyan());
    let summary = pipeline.ingestor.ingest_directory();
    println!(
        "  {} ingested, {} skipped",
        summary.ingested.to_string().green(),
        summary.skipped()
    );

    let (mut watcher, consumer) = pipeline.start_watching()?;
    println!(
        "{} {}",
        "Watching".cyan().bold(),
        pipeline.root().display()
    );
    println!("\nPress Ctrl+C to stop.\n");

    // Returns only once the watcher loop has exited
    let ingested = consumer.join().unwrap_or(0);
    watcher.stop();
    info!("Watcher ingested {} files", ingested);

    Ok(())
}
