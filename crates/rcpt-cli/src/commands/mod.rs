//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod ocr_api;
pub mod process;
pub mod receipts;
pub mod remote;
pub mod summary;
pub mod vendors;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::store::{JsonReceiptStore, JsonVendorStore, VendorRegistry};

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Path given with `--config`, else the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the config file, falling back to defaults when the default file
/// does not exist. An explicitly named file must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<RcptConfig> {
    let path = config_path(explicit);
    let mut config = if path.exists() {
        debug!("Loading config from {}", path.display());
        RcptConfig::from_file(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        RcptConfig::default()
    };

    config.storage.data_dir = resolve_data_dir(&config.storage.data_dir);
    Ok(config)
}

/// Relative data directories live under the platform data dir.
fn resolve_data_dir(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join(dir)
}

/// Vendor registry backed by the configured vendors file.
pub fn open_vendors(config: &RcptConfig) -> anyhow::Result<VendorRegistry<JsonVendorStore>> {
    let store = JsonVendorStore::new(config.storage.vendors_path());
    Ok(VendorRegistry::open(store, Utc::now())?)
}

/// Receipt list backed by the configured receipts file.
pub fn open_receipts(config: &RcptConfig) -> JsonReceiptStore {
    JsonReceiptStore::new(config.storage.receipts_path())
}
