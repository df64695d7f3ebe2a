//! Fuzzy matching of an extracted vendor name against the vendor store.

use tracing::{debug, warn};

use crate::models::receipt::UNKNOWN_VENDOR;
use crate::models::vendor::Vendor;
use crate::store::VendorStore;

/// Minimum similarity for a fuzzy vendor match.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Classic Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `(maxLen - distance) / maxLen` over lower-cased names; 1.0 for two empty
/// strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(&a, &b)) as f64 / max_len as f64
}

/// Match an extracted vendor name to a known vendor.
///
/// Exact (case-insensitive) names win; otherwise the first vendor in store
/// order that contains or is contained by the name, or whose similarity
/// reaches `threshold`. Store failures are logged and treated as no match.
pub fn match_vendor(name: &str, store: &dyn VendorStore, threshold: f64) -> Option<Vendor> {
    let name = name.trim();
    if name.is_empty() || name == UNKNOWN_VENDOR {
        return None;
    }

    match store.get_vendor_by_exact_name(name) {
        Ok(Some(vendor)) => {
            debug!("Exact vendor match '{}'", vendor.name);
            return Some(vendor);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Vendor store unavailable: {}", e);
            return None;
        }
    }

    let vendors = match store.get_vendors() {
        Ok(vendors) => vendors,
        Err(e) => {
            warn!("Vendor store unavailable: {}", e);
            return None;
        }
    };

    let lower = name.to_lowercase();
    let found = vendors.into_iter().find(|vendor| {
        let candidate = vendor.name.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }
        lower.contains(&candidate)
            || candidate.contains(&lower)
            || similarity(&lower, &candidate) >= threshold
    });

    match &found {
        Some(vendor) => debug!("Fuzzy vendor match '{}' -> '{}'", name, vendor.name),
        None => debug!("No vendor match for '{}'", name),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryVendorStore;
    use chrono::{TimeZone, Utc};

    fn store(names: &[&str]) -> MemoryVendorStore {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MemoryVendorStore::with_vendors(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Vendor::new(i.to_string(), name, created))
                .collect(),
        )
    }

    fn matched(name: &str, names: &[&str]) -> Option<String> {
        match_vendor(name, &store(names), SIMILARITY_THRESHOLD).map(|v| v.name)
    }

    struct Offline;

    impl VendorStore for Offline {
        fn get_vendors(&self) -> Result<Vec<Vendor>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn save_vendor(&mut self, _vendor: Vendor) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn delete_vendor(&mut self, id: &str) -> Result<Vendor, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("wallmart", "walmart"), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("Wallmart", "Walmart"), 0.875);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_threshold_boundary() {
        // 3 edits over 10 characters is exactly 0.7
        assert_eq!(similarity("abcdefghij", "abcdefgxyz"), 0.7);
        assert_eq!(matched("abcdefghij", &["abcdefgxyz"]), Some("abcdefgxyz".to_string()));
        // 4 edits over 10 is below
        assert_eq!(matched("abcdefghij", &["abcdefwxyz"]), None);
    }

    #[test]
    fn test_exact_match_beats_earlier_fuzzy_match() {
        assert_eq!(
            matched("Starbucks", &["Starbucks Reserve", "STARBUCKS"]),
            Some("STARBUCKS".to_string())
        );
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(
            matched("Starbucks Coffee", &["General", "Starbucks"]),
            Some("Starbucks".to_string())
        );
        assert_eq!(matched("Shell", &["Shell Gas Station"]), Some("Shell Gas Station".to_string()));
    }

    #[test]
    fn test_fuzzy_match() {
        assert_eq!(matched("Wallmart", &["Target", "Walmart"]), Some("Walmart".to_string()));
        assert_eq!(matched("Costco", &["Target", "Walmart"]), None);
    }

    #[test]
    fn test_unknown_and_empty_names_never_match() {
        assert_eq!(matched(UNKNOWN_VENDOR, &["Unknown Vendor"]), None);
        assert_eq!(matched("  ", &["General"]), None);
    }

    #[test]
    fn test_unavailable_store_is_no_match() {
        assert!(match_vendor("Walmart", &Offline, SIMILARITY_THRESHOLD).is_none());
    }
}
