//! Ingest command implementation.

use super::{describe_outcome, Pipeline};
use anyhow::Result;
use docrag_core::IngestOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Ingest a single file.
pub fn run(path: &str) -> Result<()> {
    let path = Path::new(path);
    if !path.is_file() {
        anyhow::bail!(
            "Not a file: {} (use 'docrag scan' for the whole documents folder)",
            path.display()
        );
    }

    let pipeline = Pipeline::open()?;
    if !path.canonicalize()?.starts_with(pipeline.root()) {
        println!(
            "Note: {} is outside the documents folder; its topic comes from its parent folder name.",
            path.display()
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Ingesting {}", path.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = pipeline.ingestor.ingest_file(path);
    pb.finish_with_message(describe_outcome(&outcome));

    if let IngestOutcome::Ingested(record) = &outcome {
        println!("  Path: {}", record.source_path.display());
    }

    Ok(())
}
