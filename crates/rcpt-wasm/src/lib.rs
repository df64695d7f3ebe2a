//! WASM bindings for receipt text extraction.
//!
//! This crate provides WebAssembly bindings for the JS app layer: OCR text
//! goes in, receipt records come out as plain JS objects.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use rcpt_core::receipt::similarity;
use rcpt_core::receipt::rules::classify_category;
use rcpt_core::{DateOrder, MemoryVendorStore, ReceiptParser, Vendor};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    // Maps become plain objects rather than JS `Map`s
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_vendors(vendors: JsValue) -> Result<Vec<Vendor>, JsValue> {
    if vendors.is_undefined() || vendors.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(vendors)
        .map_err(|e| JsValue::from_str(&format!("invalid vendor list: {}", e)))
}

fn reference_time(now_millis: f64) -> Result<DateTime<Utc>, JsValue> {
    DateTime::from_timestamp_millis(now_millis as i64)
        .ok_or_else(|| JsValue::from_str(&format!("invalid timestamp: {}", now_millis)))
}

/// Extract a draft receipt from OCR text.
///
/// `vendors` is the vendor list as stored by the app (may be null);
/// `now_millis` is `Date.now()` and stamps the id, `createdAt` and the date
/// fallback.
#[wasm_bindgen(js_name = extractReceiptData)]
pub fn extract_receipt_data(
    text: &str,
    vendors: JsValue,
    now_millis: f64,
) -> Result<JsValue, JsValue> {
    ReceiptExtractor::new().extract(text, vendors, now_millis)
}

/// Derive a field key from a human-entered field name.
#[wasm_bindgen(js_name = fieldKey)]
pub fn field_key(name: &str) -> String {
    rcpt_core::field_key(name)
}

/// Spending category label for a vendor name.
#[wasm_bindgen(js_name = classifyCategory)]
pub fn classify(vendor_name: &str) -> String {
    classify_category(vendor_name).label().to_string()
}

/// Name similarity in `[0, 1]`, as used by vendor matching.
#[wasm_bindgen(js_name = vendorSimilarity)]
pub fn vendor_similarity(a: &str, b: &str) -> f64 {
    similarity(a, b)
}

/// Receipt extractor class for browser use.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: ReceiptParser,
}

#[derive(Serialize)]
struct ExtractDetails {
    record: rcpt_core::ReceiptRecord,
    flattened: serde_json::Map<String, serde_json::Value>,
    warnings: Vec<String>,
    confidence: f32,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create an extractor with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: ReceiptParser::new(),
        }
    }

    /// Number of leading lines searched for the vendor name.
    #[wasm_bindgen(js_name = setVendorScanLines)]
    pub fn set_vendor_scan_lines(&mut self, lines: usize) {
        self.parser = self.parser.clone().with_vendor_scan_lines(lines);
    }

    /// Fraction of the total used when no tax line is printed (e.g. 0.1).
    #[wasm_bindgen(js_name = setTaxRate)]
    pub fn set_tax_rate(&mut self, rate: f64) -> Result<(), JsValue> {
        let rate = Decimal::try_from(rate)
            .map_err(|e| JsValue::from_str(&format!("invalid tax rate: {}", e)))?;
        self.parser = self.parser.clone().with_tax_rate(rate);
        Ok(())
    }

    /// `auto`, `day_first` or `month_first`.
    #[wasm_bindgen(js_name = setDateOrder)]
    pub fn set_date_order(&mut self, order: &str) -> Result<(), JsValue> {
        let order = match order.trim().to_lowercase().as_str() {
            "auto" => DateOrder::Auto,
            "day_first" | "dmy" => DateOrder::DayFirst,
            "month_first" | "mdy" => DateOrder::MonthFirst,
            other => return Err(JsValue::from_str(&format!("unknown date order: {}", other))),
        };
        self.parser = self.parser.clone().with_date_order(order);
        Ok(())
    }

    /// Minimum similarity for a fuzzy vendor match.
    #[wasm_bindgen(js_name = setMatchThreshold)]
    pub fn set_match_threshold(&mut self, threshold: f64) {
        self.parser = self.parser.clone().with_match_threshold(threshold);
    }

    /// Extract a receipt record.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str, vendors: JsValue, now_millis: f64) -> Result<JsValue, JsValue> {
        let store = MemoryVendorStore::with_vendors(parse_vendors(vendors)?);
        let parser = self.parser.clone().with_reference_time(reference_time(now_millis)?);
        let result = parser.parse(text, &store);
        for warning in &result.warnings {
            web_sys::console::debug_1(&JsValue::from_str(warning));
        }
        to_js(&result.record)
    }

    /// Extract a receipt record together with its flattened view, warnings
    /// and confidence.
    #[wasm_bindgen(js_name = extractWithDetails)]
    pub fn extract_with_details(
        &self,
        text: &str,
        vendors: JsValue,
        now_millis: f64,
    ) -> Result<JsValue, JsValue> {
        let store = MemoryVendorStore::with_vendors(parse_vendors(vendors)?);
        let parser = self.parser.clone().with_reference_time(reference_time(now_millis)?);
        let result = parser.parse(text, &store);

        to_js(&ExtractDetails {
            flattened: result.record.flattened(),
            record: result.record,
            warnings: result.warnings,
            confidence: result.confidence,
        })
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}
