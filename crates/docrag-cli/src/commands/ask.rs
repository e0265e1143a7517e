//! Ask command - answer a question from the indexed documents.

use super::{print_answer, Pipeline};
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

pub fn run(question: &str, topic: Option<&str>, show_sources: bool) -> Result<()> {
    let pipeline = Pipeline::open()?;

    println!();
    println!("{} {}", "Question:".cyan().bold(), question);
    println!("{}", "─".repeat(70));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Searching documents...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let answer = pipeline.assembler.answer(question, topic);
    pb.finish_and_clear();

    print_answer(&answer, show_sources);
    Ok(())
}
