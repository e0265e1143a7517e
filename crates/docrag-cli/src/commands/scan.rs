//! Full-tree scan of the documents folder.

use super::Pipeline;
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

pub fn run() -> Result<()> {
    let pipeline = Pipeline::open()?;
    pipeline.check_ollama();

    let files = pipeline.ingestor.discover_files();
    if files.is_empty() {
        println!(
            "{} {}",
            "No documents found in".yellow(),
            pipeline.root().display()
        );
        return Ok(());
    }

    println!(
        "{} {} files in {}",
        "Scanning".cyan(),
        files.len(),
        pipeline.root().display()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let summary = pipeline.ingestor.ingest_paths(&files, |path, _| {
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    });
    pb.finish_and_clear();

    println!("{}", "Scan complete".green().bold());
    println!("  Ingested:     {}", summary.ingested.to_string().green());
    println!("  Unsupported:  {}", summary.unsupported);
    println!("  Empty:        {}", summary.empty);
    if summary.failed > 0 {
        println!("  Failed:       {}", summary.failed.to_string().red());
    }
    println!("  Chunks in index: {}", pipeline.database.chunk_count()?);

    Ok(())
}
