//! Upload command: copy a file into the documents tree and ingest it.

use super::{describe_outcome, Pipeline};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(file: &str, topic: &str) -> Result<()> {
    let path = Path::new(file);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", file))?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", file))?;

    let pipeline = Pipeline::open()?;
    let outcome = pipeline
        .ingestor
        .upload(topic, file_name, &bytes)
        .context("Upload rejected")?;

    println!("{}", describe_outcome(&outcome));
    Ok(())
}
