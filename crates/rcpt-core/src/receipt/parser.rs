//! Receipt parser: runs every extraction stage and assembles the record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::config::{DateOrder, ExtractionConfig};
use crate::models::receipt::{ReceiptRecord, ReceiptStatus, VendorRef, UNKNOWN_VENDOR};
use crate::ocr::OcrOutput;
use crate::store::VendorStore;

use super::matcher::{match_vendor, SIMILARITY_THRESHOLD};
use super::rules::custom_fields::{extract_custom_fields, FieldContext};
use super::rules::{classify_category, extract_amounts, extract_date, extract_vendor_name, LineList};

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted draft record.
    pub record: ReceiptRecord,
    /// Raw text the record was extracted from.
    pub raw_text: String,
    /// Fallbacks taken during extraction.
    pub warnings: Vec<String>,
    /// Overall confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Rule-based receipt parser.
///
/// Holds configuration only, so one parser can serve any number of threads.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    /// Lines from the top considered for the vendor name.
    vendor_scan_lines: usize,
    /// Rate used to estimate tax when none is printed.
    tax_rate: Decimal,
    /// Minimum similarity for fuzzy vendor matching.
    match_threshold: f64,
    /// Day/month ordering for numeric dates.
    date_order: DateOrder,
    /// Lines from the bottom scanned for unlabeled custom amounts.
    tail_scan_lines: usize,
    /// Fixed "now"; the wall clock when unset.
    reference_time: Option<DateTime<Utc>>,
}

impl ReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            vendor_scan_lines: 8,
            tax_rate: Decimal::new(10, 2),
            match_threshold: SIMILARITY_THRESHOLD,
            date_order: DateOrder::Auto,
            tail_scan_lines: 10,
            reference_time: None,
        }
    }

    /// Create a parser from the extraction section of the config.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_vendor_scan_lines(config.vendor_scan_lines)
            .with_tax_rate(config.tax_estimate_rate)
            .with_match_threshold(config.fuzzy_match_threshold)
            .with_date_order(config.date_order)
            .with_tail_scan_lines(config.tail_scan_lines)
    }

    pub fn with_vendor_scan_lines(mut self, lines: usize) -> Self {
        self.vendor_scan_lines = lines;
        self
    }

    /// Set the tax estimate rate. Negative rates are treated as zero.
    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate.max(Decimal::ZERO);
        self
    }

    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    pub fn with_tail_scan_lines(mut self, lines: usize) -> Self {
        self.tail_scan_lines = lines;
        self
    }

    /// Pin "now". Two parses of the same text with the same reference time
    /// produce identical records.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Parse the text returned by the OCR service.
    pub fn parse_ocr(&self, output: &OcrOutput, store: &dyn VendorStore) -> ExtractionResult {
        if let Some(error) = &output.error {
            info!("OCR reported an error, extracting from empty text: {}", error);
        }
        self.parse(output.raw_text(), store)
    }

    /// Extract a draft receipt from raw OCR text. Never fails; missing
    /// information falls back to defaults and is reported in `warnings`.
    pub fn parse(&self, raw_text: &str, store: &dyn VendorStore) -> ExtractionResult {
        let now = self.reference_time.unwrap_or_else(Utc::now);
        let today = now.date_naive();
        let mut warnings = Vec::new();

        let lines = LineList::from_raw(raw_text);
        info!("Parsing receipt with {} lines", lines.len());

        // Vendor name
        let vendor = extract_vendor_name(&lines, self.vendor_scan_lines);
        if vendor.value == UNKNOWN_VENDOR {
            warnings.push("Could not extract vendor name".to_string());
        }

        // Totals
        let amounts = extract_amounts(&lines, self.tax_rate);
        if amounts.total.is_none() {
            warnings.push("Could not extract total amount".to_string());
        }
        if amounts.tax_estimated {
            let percent = self.tax_rate.saturating_mul(Decimal::ONE_HUNDRED).normalize();
            warnings.push(format!("Tax estimated at {}% of total", percent));
        }

        // Date
        let date = extract_date(&lines, self.date_order).map(|m| m.value);
        if date.is_none() {
            warnings.push("Could not extract date, using today".to_string());
        }
        let date = date.unwrap_or(today);

        let category = classify_category(&vendor.value);

        // Vendor lookup and custom fields
        let matched = match_vendor(&vendor.value, store, self.match_threshold);
        let custom_fields = match &matched {
            Some(matched) => {
                let ctx = FieldContext {
                    lines: &lines,
                    category,
                    reference_date: today,
                    date_order: self.date_order,
                    tail_scan_lines: self.tail_scan_lines,
                };
                extract_custom_fields(matched, &ctx)
            }
            None => BTreeMap::new(),
        };

        let record = ReceiptRecord {
            id: now.timestamp_millis().to_string(),
            vendor_name: vendor.value,
            matched_vendor: matched.as_ref().map(VendorRef::from),
            total_amount: amounts.total_or_zero().max(Decimal::ZERO),
            tax: amounts.tax_or_zero().max(Decimal::ZERO),
            date,
            category,
            custom_fields,
            status: ReceiptStatus::Draft,
            created_at: now,
            updated_at: None,
            firebase_id: None,
        };

        let mut confidence = 1.0f32;
        if record.vendor_name == UNKNOWN_VENDOR {
            confidence -= 0.3;
        }
        if amounts.total.is_none() {
            confidence -= 0.3;
        }
        if amounts.tax_estimated {
            confidence -= 0.1;
        }
        if record.matched_vendor.is_none() {
            confidence -= 0.1;
        }

        debug!(
            "Extracted receipt from '{}' total {} on {} ({})",
            record.vendor_name, record.total_amount, record.date, record.category
        );

        ExtractionResult {
            record,
            raw_text: raw_text.to_string(),
            warnings,
            confidence: confidence.max(0.0),
        }
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a draft receipt with default settings, stamped with the current
/// time.
pub fn extract_receipt_data(raw_text: &str, store: &dyn VendorStore) -> ReceiptRecord {
    ReceiptParser::new().parse(raw_text, store).record
}
