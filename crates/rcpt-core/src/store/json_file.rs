//! Stores persisted as pretty-printed JSON arrays.
//!
//! Every operation reads the whole file and every mutation rewrites it
//! through a temp file in the same directory, so a crash never leaves a
//! half-written list behind.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{
    append_to, delete_from, remove_from, save_into, update_in, ReceiptStore, VendorStore,
};
use crate::error::StoreError;
use crate::models::receipt::{ReceiptPatch, ReceiptRecord};
use crate::models::vendor::Vendor;

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let content = serde_json::to_string_pretty(items)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    debug!("Wrote {} entries to {}", items.len(), path.display());
    Ok(())
}

/// Vendor list stored in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonVendorStore {
    path: PathBuf,
}

impl JsonVendorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VendorStore for JsonVendorStore {
    fn get_vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        read_list(&self.path)
    }

    fn save_vendor(&mut self, vendor: Vendor) -> Result<(), StoreError> {
        let mut vendors = self.get_vendors()?;
        save_into(&mut vendors, vendor);
        write_list(&self.path, &vendors)
    }

    fn delete_vendor(&mut self, id: &str) -> Result<Vendor, StoreError> {
        let mut vendors = self.get_vendors()?;
        let removed = delete_from(&mut vendors, id)?;
        write_list(&self.path, &vendors)?;
        Ok(removed)
    }
}

/// Receipt list stored in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonReceiptStore {
    path: PathBuf,
}

impl JsonReceiptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReceiptStore for JsonReceiptStore {
    fn append(&mut self, record: ReceiptRecord) -> Result<ReceiptRecord, StoreError> {
        let mut receipts = self.list()?;
        let stored = append_to(&mut receipts, record);
        write_list(&self.path, &receipts)?;
        Ok(stored)
    }

    fn list(&self) -> Result<Vec<ReceiptRecord>, StoreError> {
        read_list(&self.path)
    }

    fn update(
        &mut self,
        id: &str,
        patch: ReceiptPatch,
        now: DateTime<Utc>,
    ) -> Result<ReceiptRecord, StoreError> {
        let mut receipts = self.list()?;
        let updated = update_in(&mut receipts, id, patch, now)?;
        write_list(&self.path, &receipts)?;
        Ok(updated)
    }

    fn remove(&mut self, id: &str) -> Result<ReceiptRecord, StoreError> {
        let mut receipts = self.list()?;
        let removed = remove_from(&mut receipts, id)?;
        write_list(&self.path, &receipts)?;
        Ok(removed)
    }
}
