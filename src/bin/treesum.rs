//! # Treesum CLI - checksum manifests from the command line
//!
//! Each argument is handled on its own:
//!
//! - a manifest (`*.md5`, or `*.sha256` with `-a sha256`) is verified and a
//!   `<name>.Verify.Good.txt` / `<name>.Verify.Bad.txt` report written next
//!   to it
//! - any other file or directory gets a manifest generated next to it
//!
//! ## Usage
//! ```bash
//! # Generate photos.md5 for a directory tree
//! treesum ./photos
//!
//! # Verify it later
//! treesum ./photos.md5
//!
//! # SHA-256, skipping node_modules, with a session log
//! treesum -a sha256 -x node_modules --log session.log ./project
//! ```
//!
//! The exit code is 1 if any verification was bad or any argument could
//! not be processed.

use clap::{Parser, ValueEnum};
use colored::*;
use humantime::format_duration;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use treesum::{DigestAlgorithm, PathOutcome, Result, Treesum};

/// Treesum CLI - generate and verify checksum manifests
#[derive(Parser)]
#[command(name = "treesum")]
#[command(version)]
#[command(about = "Generate checksum manifests for files and directory trees, or verify existing ones")]
#[command(long_about = None)]
struct Cli {
    /// Files or directories to digest, or manifests to verify
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Digest algorithm
    #[arg(short, long, value_enum, default_value = "md5")]
    algorithm: AlgorithmArg,

    /// Directory name to skip at any depth (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Volume label used to name reports for file-system roots
    #[arg(long)]
    label: Option<String>,

    /// Also append progress lines to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Prefix progress lines with a timestamp
    #[arg(long)]
    timestamps: bool,

    /// Print a JSON summary of every outcome
    #[arg(long)]
    json: bool,

    /// No per-file console output
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Md5,
    Sha256,
}

impl From<AlgorithmArg> for DigestAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Md5 => DigestAlgorithm::Md5,
            AlgorithmArg::Sha256 => DigestAlgorithm::Sha256,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(all_passed) => std::process::exit(if all_passed { 0 } else { 1 }),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Process every path; `Ok(false)` if any of them failed
fn run(cli: Cli) -> Result<bool> {
    let mut builder = Treesum::builder()
        .algorithm(cli.algorithm.into())
        .echo_progress(!cli.quiet && !cli.json)
        .timestamps(cli.timestamps);
    for name in cli.exclude {
        builder = builder.exclude(name);
    }
    if let Some(label) = cli.label {
        builder = builder.volume_label(label);
    }
    if let Some(log) = cli.log {
        builder = builder.log_file(log);
    }
    let mut treesum = builder.build()?;

    let spinner = if cli.quiet && !cli.json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Scanning files...");

        let handle = pb.clone();
        treesum = treesum.with_progress_callback(move |info| {
            handle.set_message(format!(
                "{}: {} ({})",
                info.operation,
                info.processed,
                HumanBytes(info.bytes_processed)
            ));
            handle.tick();
        });
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let outcomes = treesum.run(&cli.paths);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        println!();
        for outcome in &outcomes {
            print_outcome(outcome);
        }
        println!(
            "\n{}",
            format!("Total time: {}", format_duration(start.elapsed())).dimmed()
        );
    }

    Ok(!outcomes.iter().any(PathOutcome::is_failure))
}

fn print_outcome(outcome: &PathOutcome) {
    match outcome {
        PathOutcome::Generated(report) => match &report.manifest_path {
            Some(manifest) => {
                println!(
                    "{} {} -> {}",
                    "✓".green().bold(),
                    report.source.display(),
                    manifest.display().to_string().cyan()
                );
                println!(
                    "  Files: {} ({})",
                    report.files_digested.to_string().cyan(),
                    HumanBytes(report.bytes_digested)
                );
                if !report.cross_checks.is_empty() {
                    let bad = report.cross_check_failures();
                    let line = format!(
                        "  Cross-checks: {} ({} bad)",
                        report.cross_checks.len(),
                        bad
                    );
                    if bad > 0 {
                        println!("{}", line.red());
                    } else {
                        println!("{}", line);
                    }
                }
                if !report.unreadable.is_empty() {
                    println!(
                        "  {}",
                        format!("Unreadable: {} files", report.unreadable.len()).yellow()
                    );
                }
            }
            None => println!(
                "{} {}: no files to digest",
                "!".yellow().bold(),
                report.source.display()
            ),
        },
        PathOutcome::Verified(report) => {
            let mark = if report.is_good() {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            println!("{} {}: {}", mark, report.manifest_path.display(), report.summary());
            if let Some(path) = &report.report_path {
                println!("  Report: {}", path.display().to_string().cyan());
            }
            if report.skipped_lines > 0 {
                println!(
                    "  {}",
                    format!("Skipped {} malformed line(s)", report.skipped_lines).yellow()
                );
            }
        }
        PathOutcome::Skipped { path, reason } => {
            println!("{} {}: {}", "✗".red().bold(), path.display(), reason.red());
        }
    }
}
