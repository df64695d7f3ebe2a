//! Process command - extract data from a single receipt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::models::config::RcptConfig;
use rcpt_core::{ExtractionResult, OcrOutput, ReceiptParser, ReceiptRecord, ReceiptStore};

use super::ocr_api::OcrApiClient;

/// Extensions read as OCR text instead of being sent to the OCR service.
pub const TEXT_EXTENSIONS: [&str; 2] = ["txt", "text"];

/// Image extensions accepted by the OCR service.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (receipt image, or OCR text with --text / .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Treat the input as already recognized text
    #[arg(long)]
    text: bool,

    /// Do not append the receipt to the local list
    #[arg(long)]
    no_save: bool,

    /// Show extraction confidence and warnings
    #[arg(long)]
    show_confidence: bool,

    /// Fixed processing time (RFC 3339), used for the id and date fallback
    #[arg(long, value_parser = parse_reference_time)]
    reference_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub fn parse_reference_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time '{}': {}", s, e))
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Reading receipt...");
    pb.set_position(10);
    let ocr = if args.text || is_text_input(&args.input) {
        read_text(&args.input)?
    } else {
        pb.set_message("Running OCR...");
        pb.set_position(30);
        OcrApiClient::from_config(&config.ocr)?
            .recognize(&args.input)
            .await?
    };

    pb.set_message("Extracting receipt data...");
    pb.set_position(70);
    let result = extract(&ocr, &config, args.reference_time)?;

    let record = if args.no_save {
        result.record.clone()
    } else {
        pb.set_message("Saving receipt...");
        pb.set_position(90);
        let mut receipts = super::open_receipts(&config);
        receipts.append(result.record.clone())?
    };

    pb.finish_and_clear();

    let output = format_record(&record, args.format)?;

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

    if args.show_confidence {
        eprintln!();
        eprintln!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            result.confidence * 100.0
        );
        for warning in &result.warnings {
            eprintln!("  {} {}", style("!").yellow(), warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn is_text_input(path: &Path) -> bool {
    has_extension(path, &TEXT_EXTENSIONS)
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn read_text(path: &Path) -> anyhow::Result<OcrOutput> {
    let text = fs::read_to_string(path)?;
    Ok(OcrOutput::from_text(text))
}

/// Run the extraction pipeline against the configured vendor registry.
pub fn extract(
    ocr: &OcrOutput,
    config: &RcptConfig,
    reference_time: Option<DateTime<Utc>>,
) -> anyhow::Result<ExtractionResult> {
    let registry = super::open_vendors(config)?;
    let mut parser = ReceiptParser::from_config(&config.extraction);
    if let Some(time) = reference_time {
        parser = parser.with_reference_time(time);
    }
    Ok(parser.parse_ocr(ocr, registry.store()))
}

pub fn format_record(record: &ReceiptRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(std::slice::from_ref(record)),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// One row per receipt; custom field columns are the union over all records.
pub fn format_csv(records: &[ReceiptRecord]) -> anyhow::Result<String> {
    let mut custom_keys: Vec<&str> = records
        .iter()
        .flat_map(|r| r.custom_fields.keys().map(String::as_str))
        .collect();
    custom_keys.sort_unstable();
    custom_keys.dedup();

    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![
        "id",
        "vendor_name",
        "matched_vendor_id",
        "total_amount",
        "tax",
        "date",
        "category",
        "status",
    ];
    header.extend(custom_keys.iter().copied());
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.id.clone(),
            record.vendor_name.clone(),
            record
                .matched_vendor
                .as_ref()
                .map(|v| v.id.clone())
                .unwrap_or_default(),
            record.total_amount.to_string(),
            record.tax.to_string(),
            record.date.to_string(),
            record.category.to_string(),
            if record.is_saved() { "saved" } else { "draft" }.to_string(),
        ];
        row.extend(custom_keys.iter().map(|key| {
            record
                .custom_fields
                .get(*key)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(record: &ReceiptRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Receipt: {}\n", record.id));
    output.push_str(&format!("Vendor:   {}\n", record.vendor_name));
    if let Some(vendor) = &record.matched_vendor {
        output.push_str(&format!("Matched:  {} ({})\n", vendor.name, vendor.id));
    }
    output.push_str(&format!("Date:     {}\n", record.date));
    output.push_str(&format!("Category: {}\n", record.category));
    output.push('\n');

    output.push_str(&format!("  Total: {:.2}\n", record.total_amount));
    output.push_str(&format!("  Tax:   {:.2}\n", record.tax));

    if !record.custom_fields.is_empty() {
        output.push_str("\nFields:\n");
        for (key, value) in &record.custom_fields {
            output.push_str(&format!("  {}: {}\n", key, value));
        }
    }

    if record.is_saved() {
        output.push_str("\nSaved");
        if let Some(id) = &record.firebase_id {
            output.push_str(&format!(" ({})", id));
        }
        output.push('\n');
    }

    output
}
