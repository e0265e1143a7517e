//! Shell command - interactive REPL for DocRAG.

use super::{describe_outcome, format_size, print_answer, Pipeline};
use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

/// A parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Ask {
        topic: Option<&'a str>,
        question: String,
    },
    Docs,
    Topics,
    Upload {
        file: &'a str,
        topic: &'a str,
    },
    Help,
    Clear,
    Exit,
    Empty,
    Usage(&'static str),
    Unknown(&'a str),
}

fn parse(input: &str) -> ShellCommand<'_> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let cmd = parts.first().copied().unwrap_or("");
    let args = parts.get(1..).unwrap_or(&[]);

    match cmd {
        "" => ShellCommand::Empty,
        "help" | "?" => ShellCommand::Help,
        "exit" | "quit" | "q" => ShellCommand::Exit,
        "clear" | "cls" => ShellCommand::Clear,
        "docs" | "d" => ShellCommand::Docs,
        "topics" | "t" => ShellCommand::Topics,

        "ask" | "a" => {
            // An optional leading @topic restricts the search
            let (topic, words) = match args.split_first() {
                Some((first, rest)) if first.len() > 1 && first.starts_with('@') => {
                    (Some(&first[1..]), rest)
                }
                _ => (None, args),
            };
            if words.is_empty() {
                return ShellCommand::Usage("ask [@topic] <question>");
            }
            ShellCommand::Ask {
                topic,
                question: words.join(" "),
            }
        }

        "upload" | "u" => match args {
            &[file] => ShellCommand::Upload {
                file,
                topic: docrag_core::GENERAL_TOPIC,
            },
            &[file, topic] => ShellCommand::Upload { file, topic },
            _ => ShellCommand::Usage("upload <file> [topic]"),
        },

        other => ShellCommand::Unknown(other),
    }
}

/// Run the interactive shell.
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

    // New files are ingested in the background while the shell runs
    let (mut watcher, consumer) = pipeline.start_watching()?;

    let mut rl = DefaultEditor::new()?;
    let history_path = pipeline.paths.history_file.clone();
    let _ = rl.load_history(&history_path);

    println!();
    println!("{}", "DocRAG Interactive Shell".cyan().bold());
    println!("{}", "─".repeat(50));
    println!(
        "Watching {}. Type {} for available commands, {} to exit.",
        pipeline.root().display(),
        "help".cyan(),
        "exit".cyan()
    );
    println!();

    loop {
        let readline = rl.readline(&format!("{} ", "docrag>".green().bold()));
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match parse(line) {
                    ShellCommand::Exit => break,
                    command => {
                        if let Err(e) = execute(command, &pipeline) {
                            eprintln!("{} {:#}", "Error:".red(), e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red(), err);
                break;
            }
        }
    }

    println!("Goodbye!");

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);

    watcher.stop();
    let _ = consumer.join();

    Ok(())
}

/// Execute a shell command.
fn execute(command: ShellCommand<'_>, pipeline: &Pipeline) -> Result<()> {
    match command {
        ShellCommand::Ask { topic, question } => {
            let answer = pipeline.assembler.answer(&question, topic);
            print_answer(&answer, true);
        }

        ShellCommand::Docs => {
            let catalogue = pipeline.ingestor.repository().catalogue();
            if catalogue.is_empty() {
                println!("{}", "No documents ingested yet.".dimmed());
            } else {
                println!("{}", "Documents:".cyan().bold());
                for record in catalogue {
                    println!(
                        "  {} {} {} {}",
                        format!("[{}]", record.topic).yellow(),
                        record.file_name.white(),
                        format_size(record.size_bytes).dimmed(),
                        record
                            .ingested_at
                            .with_timezone(&chrono::Local)
                            .format("%H:%M:%S")
                            .to_string()
                            .dimmed()
                    );
                }
            }
        }

        ShellCommand::Topics => {
            let topics = pipeline.ingestor.repository().topics();
            if topics.is_empty() {
                println!("{}", "No topics yet.".dimmed());
            } else {
                println!("{}", "Topics:".cyan().bold());
                for topic in topics {
                    println!("  {}", topic.yellow());
                }
            }
        }

        ShellCommand::Upload { file, topic } => {
            let path = Path::new(file);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Invalid file name: {}", file))?;
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", file))?;

            let outcome = pipeline.ingestor.upload(topic, file_name, &bytes)?;
            println!("{}", describe_outcome(&outcome));
        }

        ShellCommand::Help => print_help(),

        ShellCommand::Clear => print!("\x1B[2J\x1B[1;1H"),

        ShellCommand::Usage(usage) => println!("Usage: {}", usage),

        ShellCommand::Unknown(cmd) => println!(
            "{} Unknown command: '{}'. Type {} for help.",
            "?".yellow(),
            cmd,
            "help".cyan()
        ),

        ShellCommand::Exit | ShellCommand::Empty => {}
    }

    Ok(())
}

/// Print help information.
fn print_help() {
    println!("{}", "Available Commands:".cyan().bold());
    println!();
    for (usage, description) in [
        ("ask [@topic] <question>", "Ask a question, optionally within one topic"),
        ("docs", "List ingested documents"),
        ("topics", "List topics"),
        ("upload <file> [topic]", "Copy a file into the documents folder"),
        ("clear", "Clear the screen"),
        ("exit", "Exit the shell"),
    ] {
        println!("  {} {}", format!("{:<25}", usage).white(), description);
    }
    println!();
    println!("{}", "Shortcuts:".cyan().bold());
    println!(
        "  {} = ask, {} = docs, {} = topics, {} = upload",
        "a".yellow(),
        "d".yellow(),
        "t".yellow(),
        "u".yellow()
    );
    println!();
}
