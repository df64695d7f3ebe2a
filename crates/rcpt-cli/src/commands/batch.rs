//! Batch processing command for multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use rcpt_core::models::config::RcptConfig;
use rcpt_core::{ExtractionResult, OcrOutput, ReceiptParser, ReceiptStore};

use super::ocr_api::OcrApiClient;
use super::process::{
    format_record, has_extension, is_text_input, parse_reference_time, read_text, OutputFormat,
    IMAGE_EXTENSIONS, TEXT_EXTENSIONS,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Do not append the receipts to the local list
    #[arg(long)]
    no_save: bool,

    /// Fixed processing time (RFC 3339) for every file
    #[arg(long, value_parser = parse_reference_time)]
    reference_time: Option<DateTime<Utc>>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| has_extension(p, &TEXT_EXTENSIONS) || has_extension(p, &IMAGE_EXTENSIONS))
        .collect();

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

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let registry = super::open_vendors(&config)?;
    let mut receipts = super::open_receipts(&config);
    let mut parser = ReceiptParser::from_config(&config.extraction);
    if let Some(time) = args.reference_time {
        parser = parser.with_reference_time(time);
    }

    // Created on the first image so text-only batches need no API key
    let mut ocr_client: Option<OcrApiClient> = None;

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = match read_input(&path, &config, &mut ocr_client).await {
            Ok(ocr) => {
                let extraction = parser.parse_ocr(&ocr, registry.store());
                if args.no_save {
                    Ok(extraction)
                } else {
                    save(&mut receipts, extraction)
                }
            }
            Err(e) => Err(e),
        };

        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(extraction) => {
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(extraction) = &result.extraction {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("receipt");

                let extension = match args.format {
                    OutputFormat::Json => "json",
                    OutputFormat::Csv => "csv",
                    OutputFormat::Text => "txt",
                };

                let output_path = output_dir.join(format!("{}.{}", output_name, extension));
                fs::write(&output_path, format_record(&extraction.record, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn read_input(
    path: &Path,
    config: &RcptConfig,
    ocr_client: &mut Option<OcrApiClient>,
) -> anyhow::Result<OcrOutput> {
    if is_text_input(path) {
        return read_text(path);
    }

    let client = match ocr_client {
        Some(client) => client,
        None => ocr_client.insert(OcrApiClient::from_config(&config.ocr)?),
    };
    Ok(client.recognize(path).await?)
}

/// Append the record and keep the stored copy, whose id may carry a suffix.
fn save(
    receipts: &mut impl ReceiptStore,
    mut extraction: ExtractionResult,
) -> anyhow::Result<ExtractionResult> {
    extraction.record = receipts.append(extraction.record)?;
    Ok(extraction)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "receipt_id",
        "vendor_name",
        "matched_vendor",
        "date",
        "category",
        "total_amount",
        "tax",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &result.extraction {
            let record = &extraction.record;
            wtr.write_record([
                filename,
                "success",
                &record.id,
                &record.vendor_name,
                record
                    .matched_vendor
                    .as_ref()
                    .map(|v| v.name.as_str())
                    .unwrap_or(""),
                &record.date.to_string(),
                record.category.label(),
                &record.total_amount.to_string(),
                &record.tax.to_string(),
                &format!("{:.2}", extraction.confidence),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcpt_core::{MemoryReceiptStore, MemoryVendorStore};

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let extraction = ReceiptParser::new().parse(
            "SHELL\n2024-03-02\nTOTAL 40.00\nTAX 3.20",
            &MemoryVendorStore::new(),
        );
        let results = vec![
            ProcessResult {
                path: PathBuf::from("a.txt"),
                extraction: Some(extraction),
                error: None,
                processing_time_ms: 3,
            },
            ProcessResult {
                path: PathBuf::from("b.jpg"),
                extraction: None,
                error: Some("service returned 403".to_string()),
                processing_time_ms: 7,
            },
        ];

        write_summary(&path, &results).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("a.txt,success,"));
        assert!(lines[1].contains(",Shell,,2024-03-02,Transportation,40.00,3.20,"));
        assert_eq!(lines[2], "b.jpg,error,,,,,,,,,7,service returned 403");
    }

    #[test]
    fn test_save_keeps_stored_id() {
        let vendors = MemoryVendorStore::new();
        let mut receipts = MemoryReceiptStore::new();
        let parser = ReceiptParser::new().with_reference_time(
            parse_reference_time("2024-03-02T12:00:00Z").unwrap(),
        );

        let first = save(&mut receipts, parser.parse("SHELL\nTOTAL 1.00", &vendors)).unwrap();
        let second = save(&mut receipts, parser.parse("SHELL\nTOTAL 2.00", &vendors)).unwrap();
        assert_ne!(first.record.id, second.record.id);
        assert_eq!(receipts.list().unwrap().len(), 2);
    }
}
