//! Receipt records produced by the extraction pipeline.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::vendor::{FieldType, Vendor};

/// Sentinel vendor name used when nothing on the receipt qualifies.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Fixed spending category vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Drinks")]
    FoodAndDrinks,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Utilities")]
    Utilities,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::FoodAndDrinks,
        Category::Shopping,
        Category::Transportation,
        Category::Entertainment,
        Category::Healthcare,
        Category::Utilities,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodAndDrinks => "Food & Drinks",
            Category::Shopping => "Shopping",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Utilities => "Utilities",
            Category::Other => "Other",
        }
    }

    /// Parse a category from its display label (case-insensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Persistence state of a receipt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Held only in the local list.
    #[default]
    Draft,
    /// Written to the remote store.
    Saved,
}

/// Value of one vendor-defined field.
///
/// Serialized as a bare JSON value. On the way back in, only JSON numbers
/// become `Number` and every string becomes `Text`, so a text value such as
/// `"12"` or `"2024-05-01"` keeps its type. A `Date` is written as its ISO
/// string and therefore reloads as `Text`; use [`FieldValue::as_date`] to
/// read either form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Date(NaiveDate),
    Text(String),
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a boolean, number or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Number(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(FieldValue::Number(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Decimal::try_from(v)
            .map(FieldValue::Number)
            .map_err(|e| E::custom(format!("invalid number {}: {}", v, e)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }
}

impl FieldValue {
    /// Parse user input according to the field's declared type.
    ///
    /// Returns `None` when the input does not fit the type.
    pub fn parse_as(field_type: FieldType, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match field_type {
            FieldType::Text | FieldType::Category => Some(FieldValue::Text(raw.to_string())),
            FieldType::Number | FieldType::Amount => {
                crate::receipt::rules::amounts::parse_amount(raw).map(FieldValue::Number)
            }
            FieldType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(FieldValue::Date),
            FieldType::Boolean => parse_bool(raw).map(FieldValue::Bool),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Date value, also accepting the ISO text a stored date reloads as.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "x" | "✓" => Some(true),
        "false" | "no" | "n" | "0" | "none" => Some(false),
        _ => None,
    }
}

/// Snapshot of the vendor a receipt was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRef {
    pub id: String,
    pub name: String,
}

impl From<&Vendor> for VendorRef {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id.clone(),
            name: vendor.name.clone(),
        }
    }
}

/// Structured result of processing one scanned receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Time-based identifier, unique within the receipt list.
    pub id: String,

    pub vendor_name: String,

    #[serde(default)]
    pub matched_vendor: Option<VendorRef>,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,

    /// Purchase date (`YYYY-MM-DD`).
    pub date: NaiveDate,

    #[serde(default)]
    pub category: Category,

    /// Values of the matched vendor's enabled custom fields.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, FieldValue>,

    #[serde(default)]
    pub status: ReceiptStatus,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Key of the remote copy, set once the receipt is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase_id: Option<String>,
}

/// Keys that resolve to the record's own columns rather than `custom_fields`.
pub const BUILT_IN_KEYS: [&str; 5] = ["vendor_name", "total_amount", "tax", "date", "category"];

impl ReceiptRecord {
    /// Look up a field value by key, built-in columns first.
    pub fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "vendor_name" => Some(FieldValue::Text(self.vendor_name.clone())),
            "total_amount" => Some(FieldValue::Number(self.total_amount)),
            "tax" => Some(FieldValue::Number(self.tax)),
            "date" => Some(FieldValue::Date(self.date)),
            "category" => Some(FieldValue::Text(self.category.label().to_string())),
            _ => self.custom_fields.get(key).cloned(),
        }
    }

    /// Flat key/value view of the record for display.
    ///
    /// Custom field values appear next to the built-in columns; the map is
    /// derived on every call so it cannot drift from `custom_fields`.
    pub fn flattened(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.remove("custom_fields");
        for (key, value) in &self.custom_fields {
            if BUILT_IN_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Ok(value) = serde_json::to_value(value) {
                map.entry(key.clone()).or_insert(value);
            }
        }
        map
    }

    pub fn is_saved(&self) -> bool {
        self.status == ReceiptStatus::Saved
    }

    /// Apply a user edit. Does not re-run extraction.
    pub fn apply(&mut self, patch: ReceiptPatch, now: DateTime<Utc>) {
        if let Some(vendor_name) = patch.vendor_name {
            self.vendor_name = vendor_name;
        }
        if let Some(total) = patch.total_amount {
            self.total_amount = total.max(Decimal::ZERO);
        }
        if let Some(tax) = patch.tax {
            self.tax = tax.max(Decimal::ZERO);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.custom_fields.extend(patch.custom_fields);
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(firebase_id) = patch.firebase_id {
            self.firebase_id = Some(firebase_id);
        }
        self.updated_at = Some(now);
    }
}

/// Partial update of a stored receipt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReceiptPatch {
    pub vendor_name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<Category>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, FieldValue>,
    pub status: Option<ReceiptStatus>,
    pub firebase_id: Option<String>,
}

impl ReceiptPatch {
    /// Patch marking a receipt as persisted remotely.
    pub fn saved(firebase_id: impl Into<String>) -> Self {
        Self {
            status: Some(ReceiptStatus::Saved),
            firebase_id: Some(firebase_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Orderings offered by the receipt list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptSort {
    /// Newest purchase date first.
    #[default]
    Date,
    /// Largest total first.
    Amount,
    /// Vendor name, alphabetical.
    Vendor,
}

impl ReceiptSort {
    pub fn sort(&self, receipts: &mut [ReceiptRecord]) {
        match self {
            ReceiptSort::Date => receipts.sort_by(|a, b| b.date.cmp(&a.date)),
            ReceiptSort::Amount => receipts.sort_by(|a, b| b.total_amount.cmp(&a.total_amount)),
            ReceiptSort::Vendor => receipts.sort_by(|a, b| {
                a.vendor_name
                    .to_lowercase()
                    .cmp(&b.vendor_name.to_lowercase())
            }),
        }
    }
}

impl FromStr for ReceiptSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(ReceiptSort::Date),
            "amount" => Ok(ReceiptSort::Amount),
            "vendor" => Ok(ReceiptSort::Vendor),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) fn record(id: &str, vendor: &str, total: &str, date: &str) -> ReceiptRecord {
        ReceiptRecord {
            id: id.to_string(),
            vendor_name: vendor.to_string(),
            matched_vendor: None,
            total_amount: Decimal::from_str(total).unwrap(),
            tax: Decimal::ZERO,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: Category::Other,
            custom_fields: BTreeMap::new(),
            status: ReceiptStatus::Draft,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            updated_at: None,
            firebase_id: None,
        }
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("food & drinks"), Some(Category::FoodAndDrinks));
        assert_eq!(Category::from_label("Utilities"), Some(Category::Utilities));
        assert_eq!(Category::from_label("Groceries"), None);
        assert_eq!(
            serde_json::to_string(&Category::FoodAndDrinks).unwrap(),
            "\"Food & Drinks\""
        );
    }

    #[test]
    fn test_field_value_parse_as() {
        assert_eq!(
            FieldValue::parse_as(FieldType::Amount, "5,00"),
            Some(FieldValue::Number(Decimal::new(500, 2)))
        );
        assert_eq!(
            FieldValue::parse_as(FieldType::Boolean, "Yes"),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(FieldValue::parse_as(FieldType::Date, "15/01/2024"), None);
        assert_eq!(
            FieldValue::parse_as(FieldType::Text, " note "),
            Some(FieldValue::Text("note".to_string()))
        );
    }

    #[test]
    fn test_field_value_json() {
        let value = FieldValue::Number(Decimal::new(500, 2));
        assert_eq!(serde_json::to_string(&value).unwrap(), "5.0");
        let text: FieldValue = serde_json::from_str("\"Latte\"").unwrap();
        assert_eq!(text, FieldValue::Text("Latte".to_string()));
        let flag: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(flag, FieldValue::Bool(true));
        let count: FieldValue = serde_json::from_str("3").unwrap();
        assert_eq!(count, FieldValue::Number(Decimal::from(3)));
    }

    #[test]
    fn test_string_values_stay_text() {
        let table: FieldValue = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(table, FieldValue::Text("12".to_string()));
        let note: FieldValue = serde_json::from_str("\"2024-05-01\"").unwrap();
        assert_eq!(note, FieldValue::Text("2024-05-01".to_string()));
        assert!(serde_json::from_str::<FieldValue>("null").is_err());
    }

    #[test]
    fn test_date_value_reloads_as_readable_date() {
        let due = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let json = serde_json::to_string(&FieldValue::Date(due)).unwrap();
        assert_eq!(json, "\"2024-05-01\"");
        let reloaded: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.as_date(), Some(due));
        assert_eq!(serde_json::to_string(&reloaded).unwrap(), json);
    }

    #[test]
    fn test_flattened_view_follows_custom_fields() {
        let mut r = record("1", "Cafe", "10.00", "2024-03-01");
        r.custom_fields
            .insert("discount".to_string(), FieldValue::Number(Decimal::new(5, 0)));
        // A custom value can never shadow a built-in column.
        r.custom_fields
            .insert("vendor_name".to_string(), FieldValue::Text("Other".to_string()));

        let flat = r.flattened();
        assert_eq!(flat["discount"], serde_json::json!(5.0));
        assert_eq!(flat["vendor_name"], "Cafe");
        assert!(!flat.contains_key("custom_fields"));

        r.apply(
            ReceiptPatch {
                custom_fields: BTreeMap::from([(
                    "discount".to_string(),
                    FieldValue::Number(Decimal::new(7, 0)),
                )]),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(r.flattened()["discount"], serde_json::json!(7.0));
        assert_eq!(r.field("discount"), Some(FieldValue::Number(Decimal::new(7, 0))));
        assert!(r.updated_at.is_some());
    }

    #[test]
    fn test_apply_clamps_negative_amounts() {
        let mut r = record("1", "Cafe", "10.00", "2024-03-01");
        r.apply(
            ReceiptPatch {
                total_amount: Some(Decimal::new(-5, 0)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(r.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_sort_orders() {
        let mut list = vec![
            record("1", "beta", "5.00", "2024-01-02"),
            record("2", "Alpha", "20.00", "2024-01-01"),
            record("3", "gamma", "10.00", "2024-01-03"),
        ];

        ReceiptSort::Date.sort(&mut list);
        assert_eq!(ids(&list), ["3", "1", "2"]);

        ReceiptSort::Amount.sort(&mut list);
        assert_eq!(ids(&list), ["2", "3", "1"]);

        ReceiptSort::Vendor.sort(&mut list);
        assert_eq!(ids(&list), ["2", "1", "3"]);
    }

    fn ids(list: &[ReceiptRecord]) -> Vec<&str> {
        list.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_record_json_shape() {
        let r = record("42", "Cafe", "45.67", "2024-03-01");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["total_amount"], serde_json::json!(45.67));
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["category"], "Other");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("firebase_id").is_none());
    }
}
