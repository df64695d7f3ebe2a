//! Keyword classification of the vendor name into a spending category.

use super::patterns::{contains_any, CATEGORY_KEYWORDS};
use crate::models::receipt::Category;

/// First bucket whose keyword appears in the vendor name, or `Other`.
pub fn classify_category(vendor_name: &str) -> Category {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(vendor_name, keywords))
        .and_then(|(label, _)| Category::from_label(label))
        .unwrap_or_default()
}
