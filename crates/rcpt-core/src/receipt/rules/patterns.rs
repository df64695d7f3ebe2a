//! Common regex patterns and keyword tables for receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Monetary tokens: "45.67", "12,50", "1,234.56" (comma as thousands separator)
    pub static ref DECIMAL_TOKEN: Regex = Regex::new(
        r"\d{1,3}(?:,\d{3})+\.\d+|\d+[.,]\d+"
    ).unwrap();

    // Price-shaped tokens used by the largest-amount fallback
    pub static ref PRICE_TOKEN: Regex = Regex::new(
        r"\d+\.\d{2}\b"
    ).unwrap();

    pub static ref TOTAL_LABEL: Regex = Regex::new(
        r"(?i)total|balance|amount"
    ).unwrap();

    pub static ref SUBTOTAL_LABEL: Regex = Regex::new(
        r"(?i)sub[\s\-]?total"
    ).unwrap();

    pub static ref TAX_LABEL: Regex = Regex::new(
        r"(?i)tax|vat|gst"
    ).unwrap();

    // Numeric dates
    pub static ref DATE_DMY_LONG: Regex = Regex::new(
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DMY_SHORT: Regex = Regex::new(
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2})\b"
    ).unwrap();

    // "March 5, 2024", "Mar. 5th 2024"
    pub static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // "5 March 2024"
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b"
    ).unwrap();

    pub static ref NON_WORD_RUN: Regex = Regex::new(
        r"[^\w]+"
    ).unwrap();

    // Phone lines; whole words so "hotel" and "motel" survive
    pub static ref PHONE_LABEL: Regex = Regex::new(
        r"(?i)\b(?:tel|phone|fax)\b"
    ).unwrap();

    // Email / web markers that hint at a letterhead line
    pub static ref CONTACT_MARKER: Regex = Regex::new(
        r"(?i)@|\.com|www\."
    ).unwrap();
}

/// Receipt boilerplate that never names the vendor.
pub const VENDOR_DENYLIST: &[&str] = &[
    "total", "subtotal", "tax", "invoice", "receipt", "date", "time", "qty",
    "price", "cash", "change", "thank", "card", "gst", "vat", "amount",
    "balance",
];

/// Words that mark a line as a business name.
pub const BUSINESS_KEYWORDS: &[&str] = &[
    "store", "market", "shop", "restaurant", "cafe", "café", "hotel", "mart",
    "pharmacy", "bakery", "grill", "pizza", "coffee", "station", "supermarket",
    "grocery", "kitchen", "diner", "bistro", "pub", "inn", "deli", "boutique",
    "outlet", "center", "centre", "ltd", "inc", "llc", "co.",
];

/// Category buckets in priority order. First bucket with a matching
/// substring wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food & Drinks",
        &[
            "starbucks", "mcdonald", "burger", "pizza", "kfc", "subway", "domino",
            "taco", "cafe", "café", "coffee", "restaurant", "bakery", "diner",
            "grill", "kitchen", "food", "deli", "dunkin", "wendy", "chipotle",
            "bistro", "sushi", "pub", "brew",
        ],
    ),
    (
        "Shopping",
        &[
            "walmart", "target", "amazon", "costco", "ikea", "mall", "store",
            "market", "shop", "mart", "grocery", "outlet", "boutique",
            "best buy", "home depot", "aldi", "lidl", "tesco",
        ],
    ),
    (
        "Transportation",
        &[
            "shell", "chevron", "exxon", "texaco", "gas", "fuel", "petrol",
            "uber", "lyft", "taxi", "parking", "station", "airline", "airways",
            "transit", "metro", "railway", "toll",
        ],
    ),
    (
        "Entertainment",
        &[
            "cinema", "movie", "theater", "theatre", "netflix", "spotify",
            "concert", "museum", "bowling", "arcade", "ticket", "stadium",
        ],
    ),
    (
        "Healthcare",
        &[
            "pharmacy", "cvs", "walgreens", "hospital", "clinic", "medical",
            "dental", "health", "drug", "doctor", "optical",
        ],
    ),
    (
        "Utilities",
        &[
            "electric", "water", "internet", "utility", "power", "energy",
            "telecom", "verizon", "comcast", "at&t", "broadband",
        ],
    ),
];

/// Header words that introduce a list of purchased items.
pub const ITEM_HEADER_WORDS: &[&str] = &["description", "item"];

/// Month number for an English month name or abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Case-insensitive check for any keyword in a line.
pub fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_token_forms() {
        let found: Vec<&str> = DECIMAL_TOKEN
            .find_iter("a 45.67 b 12,50 c 1,234.56")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, ["45.67", "12,50", "1,234.56"]);
    }

    #[test]
    fn test_phone_label_matches_whole_words() {
        assert!(PHONE_LABEL.is_match("Tel: 555-0100"));
        assert!(PHONE_LABEL.is_match("PHONE 555 0100"));
        assert!(!PHONE_LABEL.is_match("GRAND HOTEL"));
        assert!(!PHONE_LABEL.is_match("Sunset Motel"));
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("March"), Some(3));
        assert_eq!(month_number("sept"), Some(9));
        assert_eq!(month_number("Ma"), None);
    }

    #[test]
    fn test_subtotal_label() {
        assert!(SUBTOTAL_LABEL.is_match("Sub Total 10.00"));
        assert!(SUBTOTAL_LABEL.is_match("SUBTOTAL"));
        assert!(!SUBTOTAL_LABEL.is_match("Grand Total"));
    }
}
