//! Receipt extraction pipeline.
//!
//! Raw OCR text is split into lines, then each stage reads the lines
//! independently: vendor name, totals, date, category, vendor match and
//! finally the matched vendor's custom fields.

pub mod matcher;
mod parser;
pub mod rules;

pub use matcher::{levenshtein, match_vendor, similarity, SIMILARITY_THRESHOLD};
pub use parser::{extract_receipt_data, ExtractionResult, ReceiptParser};
