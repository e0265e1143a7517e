//! Configuration commands.

use super::{get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;

pub fn show() -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    if paths.config_file.exists() {
        println!("{} {}", "File:".dimmed(), paths.config_file.display());
    } else {
        println!(
            "{} {} (not created yet, showing defaults)",
            "File:".dimmed(),
            paths.config_file.display()
        );
    }
    println!(
        "{} {}",
        "Documents:".dimmed(),
        config.documents_root()?.display()
    );
    println!("{} {}", "Index:".dimmed(), paths.index_file.display());
    println!();
    println!(
        "{}",
        config
            .to_toml_string()
            .context("Failed to render configuration")?
    );

    Ok(())
}
