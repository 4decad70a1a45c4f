//! Extract command - pull invoice fields out of a single PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use billie_core::{ExtractionResult, InvoiceExtractor};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// List fields whose confidence is below the review threshold
    #[arg(long)]
    show_review: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let review_threshold = config.extraction.review_threshold;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Starting OCR engine...");

    let extractor = InvoiceExtractor::from_config(config)?;

    pb.set_message("Extracting invoice fields...");
    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || extractor.extract(&input)).await??;

    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_review {
        let flagged = result.fields_needing_review(review_threshold);
        println!();
        if flagged.is_empty() {
            println!("{} All fields above {:.0}% confidence", style("✓").green(), review_threshold * 100.0);
        } else {
            println!(
                "{} Needs review (below {:.0}%): {}",
                style("!").yellow(),
                review_threshold * 100.0,
                flagged.join(", ")
            );
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ExtractionResult) -> String {
    let rows = [
        ("Vendor", Some(result.vendor.clone()), result.vendor_confidence),
        ("Date", result.date.clone(), result.date_confidence),
        ("Total", Some(result.total.to_string()), result.total_confidence),
        ("Invoice number", result.invoice_number.clone(), result.invoice_number_confidence),
    ];

    let mut output = String::new();
    for (label, value, confidence) in rows {
        output.push_str(&format!(
            "{:<16}{} ({:.0}%)\n",
            format!("{}:", label),
            value.as_deref().unwrap_or("-"),
            confidence * 100.0
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_text_empty_record() {
        let text = format_text(&ExtractionResult::empty());

        assert_eq!(
            text,
            "Vendor:         Unknown Vendor (0%)\n\
             Date:           - (0%)\n\
             Total:          0.01 (0%)\n\
             Invoice number: - (0%)\n"
        );
    }

    #[test]
    fn test_format_json_has_all_keys() {
        let json = format_result(&ExtractionResult::empty(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        for key in [
            "vendor",
            "vendor_confidence",
            "date",
            "date_confidence",
            "total",
            "total_confidence",
            "invoice_number",
            "invoice_number_confidence",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
