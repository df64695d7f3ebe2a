//! Vendor and receipt list stores.
//!
//! Both stores are plain ordered lists. The in-memory variants back tests and
//! the wasm bindings; the JSON-file variants back the CLI.

#[cfg(feature = "native")]
pub mod json_file;
pub mod memory;
pub mod registry;

#[cfg(feature = "native")]
pub use json_file::{JsonReceiptStore, JsonVendorStore};
pub use memory::{MemoryReceiptStore, MemoryVendorStore};
pub use registry::VendorRegistry;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::receipt::{ReceiptPatch, ReceiptRecord};
use crate::models::vendor::Vendor;

/// Lookup table of known vendors and their field schemas.
pub trait VendorStore {
    /// All vendors in insertion order.
    fn get_vendors(&self) -> Result<Vec<Vendor>, StoreError>;

    /// Vendor whose name equals `name`, ignoring case.
    fn get_vendor_by_exact_name(&self, name: &str) -> Result<Option<Vendor>, StoreError> {
        Ok(self.get_vendors()?.into_iter().find(|v| v.has_name(name)))
    }

    fn get_vendor(&self, id: &str) -> Result<Option<Vendor>, StoreError> {
        Ok(self.get_vendors()?.into_iter().find(|v| v.id == id))
    }

    /// Insert a vendor or replace the one with the same id.
    fn save_vendor(&mut self, vendor: Vendor) -> Result<(), StoreError>;

    /// Remove a vendor by id, returning it.
    fn delete_vendor(&mut self, id: &str) -> Result<Vendor, StoreError>;
}

/// Local list of scanned receipts.
pub trait ReceiptStore {
    /// Add a receipt, returning it as stored (its id may gain a suffix).
    fn append(&mut self, record: ReceiptRecord) -> Result<ReceiptRecord, StoreError>;

    /// All receipts in insertion order.
    fn list(&self) -> Result<Vec<ReceiptRecord>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<ReceiptRecord>, StoreError> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Apply a user edit and stamp `updatedAt`.
    fn update(
        &mut self,
        id: &str,
        patch: ReceiptPatch,
        now: DateTime<Utc>,
    ) -> Result<ReceiptRecord, StoreError>;

    /// Remove a receipt by id. The removed record is returned so a saved
    /// receipt's remote copy can be deleted too.
    fn remove(&mut self, id: &str) -> Result<ReceiptRecord, StoreError>;
}

/// Id not yet used in `taken`: `base`, then `base-1`, `base-2`, ...
pub fn unique_id<'a>(base: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    let used = |candidate: &str| taken.clone().any(|id| id == candidate);
    if !used(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !used(candidate))
        .unwrap_or_else(|| base.to_string())
}

// List operations shared by the store implementations.

pub(crate) fn append_to(
    list: &mut Vec<ReceiptRecord>,
    mut record: ReceiptRecord,
) -> ReceiptRecord {
    record.id = unique_id(&record.id, list.iter().map(|r| r.id.as_str()));
    list.push(record.clone());
    record
}

pub(crate) fn update_in(
    list: &mut [ReceiptRecord],
    id: &str,
    patch: ReceiptPatch,
    now: DateTime<Utc>,
) -> Result<ReceiptRecord, StoreError> {
    let record = list
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    record.apply(patch, now);
    Ok(record.clone())
}

pub(crate) fn remove_from(
    list: &mut Vec<ReceiptRecord>,
    id: &str,
) -> Result<ReceiptRecord, StoreError> {
    let index = list
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(list.remove(index))
}

pub(crate) fn save_into(list: &mut Vec<Vendor>, vendor: Vendor) {
    match list.iter_mut().find(|v| v.id == vendor.id) {
        Some(existing) => *existing = vendor,
        None => list.push(vendor),
    }
}

pub(crate) fn delete_from(list: &mut Vec<Vendor>, id: &str) -> Result<Vendor, StoreError> {
    let index = list
        .iter()
        .position(|v| v.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(list.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id() {
        let taken = ["100", "100-1", "200"];
        assert_eq!(unique_id("300", taken.iter().copied()), "300");
        assert_eq!(unique_id("200", taken.iter().copied()), "200-1");
        assert_eq!(unique_id("100", taken.iter().copied()), "100-2");
    }
}
