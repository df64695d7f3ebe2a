//! Receipts command - browse and edit the local receipt list.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use console::style;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use rcpt_core::models::receipt::BUILT_IN_KEYS;
use rcpt_core::receipt::rules::parse_amount;
use rcpt_core::summary::overall_total;
use rcpt_core::{
    Category, FieldType, FieldValue, ReceiptPatch, ReceiptRecord, ReceiptSort, ReceiptStore,
    Vendor, YearMonth,
};

use super::process::{format_csv, format_record, OutputFormat};
use super::remote::{receipt_collection, receipt_document, RemoteStore};

/// Arguments for the receipts command.
#[derive(Args)]
pub struct ReceiptsArgs {
    #[command(subcommand)]
    command: ReceiptsCommand,
}

#[derive(Subcommand)]
enum ReceiptsCommand {
    /// List receipts
    List {
        /// Sort order: date, amount or vendor
        #[arg(short, long, default_value = "date")]
        sort: ReceiptSort,

        /// Only receipts from this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<YearMonth>,

        /// Output format (text prints a table)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one receipt
    Show {
        /// Receipt id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Edit a receipt
    Update {
        /// Receipt id
        id: String,

        #[arg(long)]
        vendor: Option<String>,

        #[arg(long, value_parser = parse_decimal)]
        total: Option<Decimal>,

        #[arg(long, value_parser = parse_decimal)]
        tax: Option<Decimal>,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        /// Custom field value, as key=value (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Delete a receipt (and its remote copy, once saved)
    Delete {
        /// Receipt id
        id: String,
    },

    /// Save a receipt to the remote store
    Promote {
        /// Receipt id
        id: String,
    },
}

fn parse_decimal(s: &str) -> Result<Decimal, String> {
    parse_amount(s).ok_or_else(|| format!("invalid amount '{}'", s))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_label(s).ok_or_else(|| {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        format!("unknown category '{}', expected one of: {}", s, labels.join(", "))
    })
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(args: ReceiptsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let mut receipts = super::open_receipts(&config);

    match args.command {
        ReceiptsCommand::List {
            sort,
            month,
            format,
        } => {
            let mut list = receipts.list()?;
            if let Some(month) = month {
                list.retain(|r| month.contains(r.date));
            }
            sort.sort(&mut list);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                OutputFormat::Csv => print!("{}", format_csv(&list)?),
                OutputFormat::Text => print_table(&list),
            }
        }

        ReceiptsCommand::Show { id, format } => {
            let record = find(&receipts, &id)?;
            println!("{}", format_record(&record, format)?);
        }

        ReceiptsCommand::Update {
            id,
            vendor,
            total,
            tax,
            date,
            category,
            fields,
        } => {
            let record = find(&receipts, &id)?;
            let schema = match &record.matched_vendor {
                Some(v) => super::open_vendors(&config)?.find(&v.id).ok(),
                None => None,
            };

            let mut patch = ReceiptPatch {
                vendor_name: vendor,
                total_amount: total,
                tax,
                date,
                category,
                ..Default::default()
            };
            for (key, raw) in fields {
                let value = field_value(schema.as_ref(), &key, &raw)?;
                patch.custom_fields.insert(key, value);
            }

            if patch.is_empty() {
                anyhow::bail!("Nothing to update");
            }

            let updated = receipts.update(&id, patch, Utc::now())?;
            println!("{} Updated receipt {}", style("✓").green(), updated.id);

            if updated.is_saved() {
                sync_remote(&config, &updated).await;
            }
        }

        ReceiptsCommand::Delete { id } => {
            let record = find(&receipts, &id)?;

            // Remote copy goes first; a failure leaves the local record intact
            if let Some(remote_id) = &record.firebase_id {
                let remote = RemoteStore::from_config(&config.remote)?;
                let path = format!("{}/{}", receipt_collection(&record), remote_id);
                remote
                    .remove(&path)
                    .await
                    .with_context(|| format!("Failed to delete remote copy of receipt {}", id))?;
                debug!("Removed remote copy {}", path);
            }

            let removed = receipts.remove(&id)?;
            println!("{} Deleted receipt {}", style("✓").green(), removed.id);
        }

        ReceiptsCommand::Promote { id } => {
            let record = find(&receipts, &id)?;
            if record.is_saved() {
                anyhow::bail!("Receipt {} is already saved", id);
            }

            let remote = RemoteStore::from_config(&config.remote)?;
            let remote_id = remote
                .push(&receipt_collection(&record), &receipt_document(&record))
                .await?;
            receipts.update(&id, ReceiptPatch::saved(remote_id.clone()), Utc::now())?;

            println!(
                "{} Saved receipt {} as {}",
                style("✓").green(),
                id,
                remote_id
            );
        }
    }

    Ok(())
}

fn find(receipts: &impl ReceiptStore, id: &str) -> anyhow::Result<ReceiptRecord> {
    receipts
        .get(id)?
        .ok_or_else(|| anyhow::anyhow!("Receipt not found: {}", id))
}

/// Parse a custom field value using the vendor's declared type; unknown keys
/// are stored as text.
fn field_value(vendor: Option<&Vendor>, key: &str, raw: &str) -> anyhow::Result<FieldValue> {
    if BUILT_IN_KEYS.contains(&key) {
        anyhow::bail!("'{}' is a built-in column; use its own flag", key);
    }
    let field_type = vendor
        .and_then(|v| v.field(key))
        .map(|f| f.field_type)
        .unwrap_or(FieldType::Text);
    FieldValue::parse_as(field_type, raw)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a valid {} for '{}'", raw, field_type, key))
}

/// Mirror an edit of a saved receipt to its remote copy. Failures only warn;
/// the local edit stands.
async fn sync_remote(config: &rcpt_core::RcptConfig, record: &ReceiptRecord) {
    let Some(remote_id) = &record.firebase_id else {
        return;
    };
    let path = format!("{}/{}", receipt_collection(record), remote_id);
    let result = match RemoteStore::from_config(&config.remote) {
        Ok(remote) => remote.update(&path, &receipt_document(record)).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Remote copy {} not updated: {:#}", path, e);
    }
}

fn print_table(receipts: &[ReceiptRecord]) {
    if receipts.is_empty() {
        println!("No receipts.");
        return;
    }

    println!(
        "{:<16} {:<10} {:<24} {:<14} {:>10} {:<6}",
        "ID", "DATE", "VENDOR", "CATEGORY", "TOTAL", "STATUS"
    );
    for r in receipts {
        let status = if r.is_saved() { "saved" } else { "draft" };
        println!(
            "{:<16} {:<10} {:<24} {:<14} {:>10} {:<6}",
            r.id,
            r.date.to_string(),
            r.vendor_name,
            r.category.label(),
            format!("{:.2}", r.total_amount),
            status
        );
    }
    let total = overall_total(receipts);
    println!("{} receipt(s), total {:.2}", receipts.len(), total);
}
