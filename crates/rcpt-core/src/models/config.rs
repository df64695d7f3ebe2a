//! Configuration structures for the receipt pipeline and its collaborators.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for rcpt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,

    /// Local storage configuration.
    pub storage: StorageConfig,

    /// OCR API configuration.
    pub ocr: OcrConfig,

    /// Remote document store configuration.
    pub remote: RemoteConfig,
}

/// How ambiguous numeric dates such as `03/04/2024` are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// First component above 12 means day-first, otherwise month-first.
    #[default]
    Auto,
    /// Always `D/M/Y`.
    DayFirst,
    /// Always `M/D/Y`.
    MonthFirst,
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of leading lines searched for the vendor name.
    pub vendor_scan_lines: usize,

    /// Fraction of the total used as tax when no tax line is printed.
    pub tax_estimate_rate: Decimal,

    /// Minimum name similarity (0.0 - 1.0) for a fuzzy vendor match.
    pub fuzzy_match_threshold: f64,

    /// Day/month order for ambiguous numeric dates.
    pub date_order: DateOrder,

    /// Trailing lines searched when a numeric field label is not found.
    pub tail_scan_lines: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            vendor_scan_lines: 8,
            tax_estimate_rate: Decimal::new(10, 2),
            fuzzy_match_threshold: 0.7,
            date_order: DateOrder::Auto,
            tail_scan_lines: 10,
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the JSON stores.
    pub data_dir: PathBuf,

    /// Receipt list file name.
    pub receipts_file: String,

    /// Vendor registry file name.
    pub vendors_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            receipts_file: "receipts.json".to_string(),
            vendors_file: "vendors.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn receipts_path(&self) -> PathBuf {
        self.data_dir.join(&self.receipts_file)
    }

    pub fn vendors_path(&self) -> PathBuf {
        self.data_dir.join(&self.vendors_file)
    }
}

/// OCR API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Endpoint accepting base64 images.
    pub api_url: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Recognition language code.
    pub language: String,

    /// Engine selector understood by the service.
    pub engine: u8,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.ocr.space/parse/image".to_string(),
            api_key: String::new(),
            language: "eng".to_string(),
            engine: 2,
            timeout_secs: 30,
        }
    }
}

/// Remote document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Database root URL, e.g. `https://<project>.firebaseio.com`.
    pub database_url: Option<String>,

    /// Auth token appended to every request.
    pub auth_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
