//! Batch command - extract fields from many PDFs concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use billie_core::{ExtractionResult, InvoiceExtractor};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of documents processed at once
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Result<ExtractionResult, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let review_threshold = config.extraction.review_threshold;

    let files = matching_pdfs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // One engine for the whole batch; OCR runs on the blocking pool.
    let extractor = Arc::new(InvoiceExtractor::from_config(config)?);
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let extractor = Arc::clone(&extractor);
        let pb = pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = extractor.extract(&path).map_err(|e| e.to_string());
            pb.inc(1);
            FileOutcome {
                path,
                result,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await?;

        match &outcome.result {
            Ok(result) => {
                let output_path = output_path_for(&outcome.path, args.output_dir.as_deref());
                fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
                debug!(
                    "Wrote {} ({}ms)",
                    output_path.display(),
                    outcome.processing_time_ms
                );
            }
            Err(message) if args.continue_on_error => {
                warn!("Failed to process {}: {}", outcome.path.display(), message);
            }
            Err(message) => {
                pb.abandon();
                error!("Failed to process {}: {}", outcome.path.display(), message);
                anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), message);
            }
        }

        outcomes.push(outcome);
    }

    pb.finish_and_clear();

    let failed: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let flagged = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .filter(|r| !r.fields_needing_review(review_threshold).is_empty())
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} need review",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red(),
        style(flagged).yellow()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(message) = &outcome.result {
                println!("  - {}: {}", outcome.path.display(), message);
            }
        }
    }

    Ok(())
}

/// Expand a glob into the PDF files it matches, in path order.
fn matching_pdfs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}.json", stem))
}
