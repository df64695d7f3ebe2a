//! Summary command - monthly spending overview.

use chrono::Utc;
use clap::Args;
use console::style;
use rust_decimal::Decimal;

use rcpt_core::{ReceiptStore, SpendingSummary, YearMonth};

/// Arguments for the summary command.
#[derive(Args)]
pub struct SummaryArgs {
    /// Month to summarize (YYYY-MM, default: current month)
    #[arg(short, long)]
    month: Option<YearMonth>,

    /// Number of months in the trend
    #[arg(long, default_value = "6")]
    months: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: SummaryFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SummaryFormat {
    /// Plain text report
    Text,
    /// JSON output
    Json,
}

pub async fn run(args: SummaryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let receipts = super::open_receipts(&config).list()?;

    let month = args
        .month
        .unwrap_or_else(|| YearMonth::of(Utc::now().date_naive()));
    let summary = SpendingSummary::build(&receipts, month, args.months);

    match args.format {
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        SummaryFormat::Text => print!("{}", format_summary(&summary)),
    }

    Ok(())
}

fn format_summary(summary: &SpendingSummary) -> String {
    let cmp = &summary.comparison;
    let mut output = String::new();

    output.push_str(&format!("Spending for {}\n", cmp.month.label()));
    output.push_str(&format!("  Total:          {:.2}\n", cmp.total));
    output.push_str(&format!("  Previous month: {:.2}\n", cmp.previous_total));
    let change = match cmp.change_percent {
        Some(percent) => format!("{:+.2} ({:+}%)", cmp.change, percent),
        None => format!("{:+.2}", cmp.change),
    };
    let change = if cmp.change > Decimal::ZERO {
        style(change).red()
    } else {
        style(change).green()
    };
    output.push_str(&format!("  Change:         {}\n", change));

    output.push_str("\nBy category:\n");
    if summary.categories.is_empty() {
        output.push_str("  (no receipts)\n");
    }
    for c in &summary.categories {
        output.push_str(&format!(
            "  {:<16} {:>10} ({})\n",
            c.category.label(),
            format!("{:.2}", c.amount),
            c.count
        ));
    }

    output.push_str("\nTrend:\n");
    for m in &summary.trend {
        output.push_str(&format!(
            "  {:<9} {:>10} ({})\n",
            m.label,
            format!("{:.2}", m.total),
            m.receipt_count
        ));
    }

    if !summary.available_months.is_empty() {
        let months: Vec<String> = summary
            .available_months
            .iter()
            .map(|m| m.to_string())
            .collect();
        output.push_str(&format!("\nMonths with receipts: {}\n", months.join(", ")));
    }

    output.push_str(&format!(
        "\nAll time: {:.2} over {} receipt(s)\n",
        summary.overall_total, summary.receipt_count
    ));

    output
}
