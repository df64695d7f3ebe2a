//! Error types for the rcpt-core library.
//!
//! Extraction itself never fails: every stage degrades to a default value.
//! The errors below belong to the collaborators around the pipeline
//! (stores, vendor schema edits, OCR transport).

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Vendor or field schema rule violated.
    #[error("vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// OCR service error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by vendor and receipt stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),

    /// No record with the given id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Violations of vendor and field schema invariants.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VendorError {
    /// Vendor name is empty after trimming.
    #[error("vendor name must not be empty")]
    EmptyName,

    /// Another vendor already uses this name (case-insensitive).
    #[error("vendor with name '{0}' already exists")]
    DuplicateName(String),

    /// The vendor set would become empty.
    #[error("at least one vendor must remain")]
    LastVendor,

    /// No vendor with the given id or name.
    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    /// Field name produced an empty key.
    #[error("field name must contain at least one letter or digit")]
    EmptyFieldName,

    /// Field label is empty after trimming.
    #[error("field label must not be empty")]
    EmptyLabel,

    /// A field with the same key already exists on the vendor.
    #[error("field '{0}' already exists")]
    DuplicateField(String),

    /// Common fields cannot be edited, disabled or deleted.
    #[error("field '{0}' is a common field and cannot be changed")]
    CommonField(String),

    /// No field with the given key.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Errors related to the external OCR service.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The input image could not be read.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
