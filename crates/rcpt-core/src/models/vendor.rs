//! Vendors and their user-configurable field schemas.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::VendorError;

lazy_static! {
    static ref NON_KEY_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Data type of a vendor field. Drives which extraction heuristic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Amount,
    Date,
    Category,
    Boolean,
}

impl FieldType {
    /// All field types in display order.
    pub const ALL: [FieldType; 6] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Amount,
        FieldType::Date,
        FieldType::Category,
        FieldType::Boolean,
    ];

    /// Parse a field type from its lowercase name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(FieldType::Text),
            "number" => Some(FieldType::Number),
            "amount" => Some(FieldType::Amount),
            "date" => Some(FieldType::Date),
            "category" => Some(FieldType::Category),
            "boolean" | "bool" | "yes/no" => Some(FieldType::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Amount => "amount",
            FieldType::Date => "date",
            FieldType::Category => "category",
            FieldType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of one data field on a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Machine identifier, unique within the vendor.
    pub key: String,

    /// Display name.
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Disabled fields are skipped by extraction and display.
    pub enabled: bool,

    /// User-added field.
    #[serde(default)]
    pub custom: bool,

    /// Built-in field shipped with every vendor. Immutable and always enabled.
    #[serde(default)]
    pub common: bool,

    /// Value used when extraction yields nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldSchema {
    fn common(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            enabled: true,
            custom: false,
            common: true,
            default_value: None,
        }
    }

    /// Build a user-defined field from a human-entered name.
    pub fn custom(
        name: &str,
        label: &str,
        field_type: FieldType,
    ) -> Result<Self, VendorError> {
        let key = field_key(name);
        if key.is_empty() {
            return Err(VendorError::EmptyFieldName);
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(VendorError::EmptyLabel);
        }

        Ok(Self {
            key,
            label: label.to_string(),
            field_type,
            enabled: true,
            custom: true,
            common: false,
            default_value: None,
        })
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Derive a field key from a human-entered name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `_`, and trims leading/trailing underscores.
pub fn field_key(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_KEY_CHARS
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// The five fields every vendor starts with.
pub fn common_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::common("vendor_name", "Vendor Name", FieldType::Text),
        FieldSchema::common("total_amount", "Total Amount", FieldType::Amount),
        FieldSchema::common("tax", "Tax Amount", FieldType::Amount),
        FieldSchema::common("date", "Purchase Date", FieldType::Date),
        FieldSchema::common("category", "Category", FieldType::Category),
    ]
}

/// A merchant with its own field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    /// Opaque time-based identifier.
    pub id: String,

    /// Unique (case-insensitive) display name.
    pub name: String,

    pub fields: Vec<FieldSchema>,

    pub created_at: DateTime<Utc>,
}

/// Field counts shown next to a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldStats {
    pub total: usize,
    pub active: usize,
    pub custom: usize,
}

/// Changes applied by [`Vendor::update_field`].
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    /// New human-entered name; re-derives the key.
    pub name: Option<String>,
    pub label: Option<String>,
    pub field_type: Option<FieldType>,
    pub default_value: Option<Option<String>>,
}

impl Vendor {
    /// Create a vendor carrying the common fields.
    pub fn new(id: impl Into<String>, name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.trim().to_string(),
            fields: common_fields(),
            created_at,
        }
    }

    /// Whether `name` names this vendor, ignoring case and surrounding space.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Enabled fields in schema order.
    pub fn enabled_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.enabled)
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats {
            total: self.fields.len(),
            active: self.fields.iter().filter(|f| f.enabled).count(),
            custom: self.fields.iter().filter(|f| f.custom).count(),
        }
    }

    /// Add a user-defined field. Keys must stay unique.
    pub fn add_field(&mut self, field: FieldSchema) -> Result<(), VendorError> {
        if self.field(&field.key).is_some() {
            return Err(VendorError::DuplicateField(field.key));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Edit a custom field in place.
    pub fn update_field(&mut self, key: &str, update: FieldUpdate) -> Result<(), VendorError> {
        let index = self.editable_index(key)?;

        let new_key = match &update.name {
            Some(name) => {
                let derived = field_key(name);
                if derived.is_empty() {
                    return Err(VendorError::EmptyFieldName);
                }
                if derived != key && self.field(&derived).is_some() {
                    return Err(VendorError::DuplicateField(derived));
                }
                Some(derived)
            }
            None => None,
        };

        let label = match &update.label {
            Some(label) if label.trim().is_empty() => return Err(VendorError::EmptyLabel),
            Some(label) => Some(label.trim().to_string()),
            None => None,
        };

        let field = &mut self.fields[index];
        if let Some(new_key) = new_key {
            field.key = new_key;
        }
        if let Some(label) = label {
            field.label = label;
        }
        if let Some(field_type) = update.field_type {
            field.field_type = field_type;
        }
        if let Some(default_value) = update.default_value {
            field.default_value = default_value;
        }
        Ok(())
    }

    /// Remove a custom field.
    pub fn remove_field(&mut self, key: &str) -> Result<FieldSchema, VendorError> {
        let index = self.editable_index(key)?;
        Ok(self.fields.remove(index))
    }

    /// Flip a custom field's enabled flag, returning the new state.
    pub fn toggle_field(&mut self, key: &str) -> Result<bool, VendorError> {
        let index = self.editable_index(key)?;
        let field = &mut self.fields[index];
        field.enabled = !field.enabled;
        Ok(field.enabled)
    }

    fn editable_index(&self, key: &str) -> Result<usize, VendorError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.key == key)
            .ok_or_else(|| VendorError::UnknownField(key.to_string()))?;
        if self.fields[index].common {
            return Err(VendorError::CommonField(key.to_string()));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vendor() -> Vendor {
        Vendor::new("1", "  General ", Utc::now())
    }

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("Discount"), "discount");
        assert_eq!(field_key("Loyalty Card #"), "loyalty_card");
        assert_eq!(field_key("  --Tip (15%)--  "), "tip_15");
        assert_eq!(field_key("a___b"), "a_b");
        assert_eq!(field_key("!!!"), "");
    }

    #[test]
    fn test_new_vendor_has_common_fields() {
        let v = vendor();
        assert_eq!(v.name, "General");
        let keys: Vec<&str> = v.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["vendor_name", "total_amount", "tax", "date", "category"]);
        assert!(v.fields.iter().all(|f| f.common && f.enabled && !f.custom));
    }

    #[test]
    fn test_has_name_folds_unicode_case() {
        let v = Vendor::new("2", "Café Noir", Utc::now());
        assert!(v.has_name("CAFÉ NOIR"));
        assert!(v.has_name(" café noir "));
        assert!(!v.has_name("Cafe Noir"));
    }

    #[test]
    fn test_add_field_rejects_duplicate_key() {
        let mut v = vendor();
        let field = FieldSchema::custom("Discount", "Discount", FieldType::Amount).unwrap();
        v.add_field(field.clone()).unwrap();
        assert_eq!(
            v.add_field(field),
            Err(VendorError::DuplicateField("discount".to_string()))
        );
        assert_eq!(v.stats(), FieldStats { total: 6, active: 6, custom: 1 });
    }

    #[test]
    fn test_custom_field_validation() {
        assert_eq!(
            FieldSchema::custom("???", "Label", FieldType::Text),
            Err(VendorError::EmptyFieldName)
        );
        assert_eq!(
            FieldSchema::custom("Name", "  ", FieldType::Text),
            Err(VendorError::EmptyLabel)
        );
    }

    #[test]
    fn test_common_fields_are_immutable() {
        let mut v = vendor();
        assert_eq!(
            v.toggle_field("tax"),
            Err(VendorError::CommonField("tax".to_string()))
        );
        assert_eq!(
            v.remove_field("date").unwrap_err(),
            VendorError::CommonField("date".to_string())
        );
        assert_eq!(
            v.update_field("category", FieldUpdate::default()),
            Err(VendorError::CommonField("category".to_string()))
        );
        assert!(v.field("tax").unwrap().enabled);
    }

    #[test]
    fn test_toggle_and_update_custom_field() {
        let mut v = vendor();
        v.add_field(FieldSchema::custom("Tip", "Tip", FieldType::Amount).unwrap())
            .unwrap();

        assert_eq!(v.toggle_field("tip"), Ok(false));
        assert_eq!(v.enabled_fields().count(), 5);

        v.update_field(
            "tip",
            FieldUpdate {
                name: Some("Gratuity".to_string()),
                label: Some("Gratuity".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(v.field("tip").is_none());
        assert_eq!(v.field("gratuity").unwrap().label, "Gratuity");
    }

    #[test]
    fn test_update_field_rejects_key_collision() {
        let mut v = vendor();
        v.add_field(FieldSchema::custom("Tip", "Tip", FieldType::Amount).unwrap())
            .unwrap();
        let err = v
            .update_field(
                "tip",
                FieldUpdate {
                    name: Some("Tax".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, VendorError::DuplicateField("tax".to_string()));
    }

    #[test]
    fn test_schema_json_shape() {
        let field = FieldSchema::custom("Discount", "Discount", FieldType::Amount)
            .unwrap()
            .with_default("0");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "amount");
        assert_eq!(json["defaultValue"], "0");
        assert_eq!(json["custom"], true);
    }
}
