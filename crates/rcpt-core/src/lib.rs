//! Core library for receipt text extraction.
//!
//! This crate provides:
//! - Receipt extraction from OCR text (vendor, totals, date, category)
//! - Fuzzy vendor matching and vendor-defined custom fields
//! - Vendor and receipt list stores (in-memory and JSON file)
//! - Spending summaries over the receipt list

pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod store;
pub mod summary;

pub use error::{OcrError, RcptError, Result, StoreError, VendorError};
pub use models::config::{DateOrder, RcptConfig};
pub use models::receipt::{
    Category, FieldValue, ReceiptPatch, ReceiptRecord, ReceiptSort, ReceiptStatus, VendorRef,
    UNKNOWN_VENDOR,
};
pub use models::vendor::{field_key, FieldSchema, FieldType, FieldUpdate, Vendor};
pub use ocr::OcrOutput;
pub use receipt::{extract_receipt_data, ExtractionResult, ReceiptParser};
pub use store::{MemoryReceiptStore, MemoryVendorStore, ReceiptStore, VendorRegistry, VendorStore};
#[cfg(feature = "native")]
pub use store::{JsonReceiptStore, JsonVendorStore};
pub use summary::{SpendingSummary, YearMonth};
