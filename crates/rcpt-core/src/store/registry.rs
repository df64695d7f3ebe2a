//! Vendor registry: the rules around creating, editing and deleting vendors.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{unique_id, VendorStore};
use crate::error::{RcptError, Result, VendorError};
use crate::models::vendor::{FieldSchema, FieldType, FieldUpdate, Vendor};

/// Name of the vendor seeded into an empty registry.
pub const DEFAULT_VENDOR_NAME: &str = "General";

/// Id of the seeded vendor.
pub const DEFAULT_VENDOR_ID: &str = "1";

/// Vendor operations over any [`VendorStore`].
///
/// Keeps the vendor set non-empty and names unique.
pub struct VendorRegistry<S: VendorStore> {
    store: S,
}

impl<S: VendorStore> VendorRegistry<S> {
    /// Wrap a store, seeding the `General` vendor if it is empty.
    pub fn open(mut store: S, now: DateTime<Utc>) -> Result<Self> {
        if store.get_vendors()?.is_empty() {
            info!("Seeding vendor store with '{}'", DEFAULT_VENDOR_NAME);
            store.save_vendor(Vendor::new(DEFAULT_VENDOR_ID, DEFAULT_VENDOR_NAME, now))?;
        }
        Ok(Self { store })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn vendors(&self) -> Result<Vec<Vendor>> {
        Ok(self.store.get_vendors()?)
    }

    /// Find a vendor by id, or by name ignoring case.
    pub fn find(&self, id_or_name: &str) -> Result<Vendor> {
        let vendors = self.store.get_vendors()?;
        vendors
            .iter()
            .find(|v| v.id == id_or_name)
            .or_else(|| {
                vendors.iter().find(|v| v.has_name(id_or_name))
            })
            .cloned()
            .ok_or_else(|| VendorError::UnknownVendor(id_or_name.to_string()).into())
    }

    /// Create a vendor with the common fields. The id is derived from `now`.
    pub fn create_vendor(&mut self, name: &str, now: DateTime<Utc>) -> Result<Vendor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VendorError::EmptyName.into());
        }

        let vendors = self.store.get_vendors()?;
        if vendors.iter().any(|v| v.has_name(name)) {
            return Err(VendorError::DuplicateName(name.to_string()).into());
        }

        let id = unique_id(
            &now.timestamp_millis().to_string(),
            vendors.iter().map(|v| v.id.as_str()),
        );
        let vendor = Vendor::new(id, name, now);
        self.store.save_vendor(vendor.clone())?;

        info!("Created vendor '{}' ({})", vendor.name, vendor.id);
        Ok(vendor)
    }

    /// Delete a vendor. The last remaining vendor cannot be deleted.
    pub fn delete_vendor(&mut self, id: &str) -> Result<Vendor> {
        let vendors = self.store.get_vendors()?;
        if !vendors.iter().any(|v| v.id == id) {
            return Err(VendorError::UnknownVendor(id.to_string()).into());
        }
        if vendors.len() <= 1 {
            return Err(VendorError::LastVendor.into());
        }

        let removed = self.store.delete_vendor(id)?;
        info!("Deleted vendor '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub fn add_field(
        &mut self,
        vendor_id: &str,
        name: &str,
        label: &str,
        field_type: FieldType,
        default_value: Option<String>,
    ) -> Result<FieldSchema> {
        let mut field = FieldSchema::custom(name, label, field_type)?;
        field.default_value = default_value;
        self.edit(vendor_id, |vendor| {
            vendor.add_field(field.clone())?;
            Ok(field)
        })
    }

    pub fn update_field(&mut self, vendor_id: &str, key: &str, update: FieldUpdate) -> Result<()> {
        self.edit(vendor_id, |vendor| vendor.update_field(key, update))
    }

    pub fn remove_field(&mut self, vendor_id: &str, key: &str) -> Result<FieldSchema> {
        self.edit(vendor_id, |vendor| vendor.remove_field(key))
    }

    /// Returns the field's new enabled state.
    pub fn toggle_field(&mut self, vendor_id: &str, key: &str) -> Result<bool> {
        self.edit(vendor_id, |vendor| vendor.toggle_field(key))
    }

    /// Load a vendor, apply a schema edit and write it back.
    fn edit<T>(
        &mut self,
        vendor_id: &str,
        f: impl FnOnce(&mut Vendor) -> std::result::Result<T, VendorError>,
    ) -> Result<T> {
        let mut vendor = self
            .store
            .get_vendor(vendor_id)?
            .ok_or_else(|| RcptError::from(VendorError::UnknownVendor(vendor_id.to_string())))?;
        let out = f(&mut vendor)?;
        self.store.save_vendor(vendor)?;
        Ok(out)
    }
}
