//! In-memory stores.

use chrono::{DateTime, Utc};

use super::{
    append_to, delete_from, remove_from, save_into, update_in, ReceiptStore, VendorStore,
};
use crate::error::StoreError;
use crate::models::receipt::{ReceiptPatch, ReceiptRecord};
use crate::models::vendor::Vendor;

#[derive(Debug, Clone, Default)]
pub struct MemoryVendorStore {
    vendors: Vec<Vendor>,
}

impl MemoryVendorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vendors(vendors: Vec<Vendor>) -> Self {
        Self { vendors }
    }
}

impl VendorStore for MemoryVendorStore {
    fn get_vendors(&self) -> Result<Vec<Vendor>, StoreError> {
        Ok(self.vendors.clone())
    }

    fn save_vendor(&mut self, vendor: Vendor) -> Result<(), StoreError> {
        save_into(&mut self.vendors, vendor);
        Ok(())
    }

    fn delete_vendor(&mut self, id: &str) -> Result<Vendor, StoreError> {
        delete_from(&mut self.vendors, id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReceiptStore {
    receipts: Vec<ReceiptRecord>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn append(&mut self, record: ReceiptRecord) -> Result<ReceiptRecord, StoreError> {
        Ok(append_to(&mut self.receipts, record))
    }

    fn list(&self) -> Result<Vec<ReceiptRecord>, StoreError> {
        Ok(self.receipts.clone())
    }

    fn update(
        &mut self,
        id: &str,
        patch: ReceiptPatch,
        now: DateTime<Utc>,
    ) -> Result<ReceiptRecord, StoreError> {
        update_in(&mut self.receipts, id, patch, now)
    }

    fn remove(&mut self, id: &str) -> Result<ReceiptRecord, StoreError> {
        remove_from(&mut self.receipts, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::tests::record;
    use crate::models::receipt::ReceiptStatus;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_exact_name_lookup_ignores_case() {
        let mut store = MemoryVendorStore::new();
        store.save_vendor(Vendor::new("1", "Starbucks", now())).unwrap();

        let found = store.get_vendor_by_exact_name("  STARBUCKS ").unwrap();
        assert_eq!(found.map(|v| v.id), Some("1".to_string()));
        assert!(store.get_vendor_by_exact_name("Star").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_by_id() {
        let mut store = MemoryVendorStore::new();
        store.save_vendor(Vendor::new("1", "Old", now())).unwrap();
        store.save_vendor(Vendor::new("1", "New", now())).unwrap();

        let vendors = store.get_vendors().unwrap();
        assert_eq!(vendors.len(), 1);
        assert_eq!(vendors[0].name, "New");
    }

    #[test]
    fn test_append_resolves_id_collisions() {
        let mut store = MemoryReceiptStore::new();
        let a = store.append(record("42", "A", "1.00", "2024-01-01")).unwrap();
        let b = store.append(record("42", "B", "2.00", "2024-01-02")).unwrap();

        assert_eq!(a.id, "42");
        assert_eq!(b.id, "42-1");
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_update_and_remove() {
        let mut store = MemoryReceiptStore::new();
        store.append(record("1", "A", "1.00", "2024-01-01")).unwrap();

        let patch = ReceiptPatch {
            total_amount: Some(Decimal::new(-5, 0)),
            ..ReceiptPatch::saved("-Nabc")
        };
        let updated = store.update("1", patch, now()).unwrap();
        assert_eq!(updated.total_amount, Decimal::ZERO);
        assert_eq!(updated.status, ReceiptStatus::Saved);
        assert_eq!(updated.updated_at, Some(now()));

        let removed = store.remove("1").unwrap();
        assert_eq!(removed.firebase_id.as_deref(), Some("-Nabc"));
        assert!(matches!(store.remove("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update("1", ReceiptPatch::default(), now()),
            Err(StoreError::NotFound(_))
        ));
    }
}
