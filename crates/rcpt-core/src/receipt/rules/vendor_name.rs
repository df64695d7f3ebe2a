//! Vendor name heuristics over the top of the receipt.

use tracing::debug;

use super::lines::LineList;
use super::patterns::{
    contains_any, BUSINESS_KEYWORDS, CONTACT_MARKER, PHONE_LABEL, VENDOR_DENYLIST,
};
use super::ExtractionMatch;
use crate::models::receipt::UNKNOWN_VENDOR;

pub const BUSINESS_KEYWORD_WEIGHT: u32 = 10;
pub const UPPERCASE_WEIGHT: u32 = 5;
pub const CONTACT_WEIGHT: u32 = 2;
pub const GENERIC_WEIGHT: u32 = 1;

/// Score a candidate line. Zero means "not a vendor line".
pub fn score_line(line: &str) -> u32 {
    let len = line.chars().count();
    let mut score = 0;

    if contains_any(line, BUSINESS_KEYWORDS) {
        score += BUSINESS_KEYWORD_WEIGHT;
    }

    let has_letter = line.chars().any(char::is_alphabetic);
    if has_letter && line == line.to_uppercase() && (3..=40).contains(&len) {
        score += UPPERCASE_WEIGHT;
    }

    if CONTACT_MARKER.is_match(line) {
        score += CONTACT_WEIGHT;
    }

    if has_letter && len > 2 && len < 50 {
        score += GENERIC_WEIGHT;
    }

    score
}

/// Pick the vendor name from the first `scan_lines` lines.
///
/// Returns the title-cased name, or the unknown-vendor sentinel.
pub fn extract_vendor_name(lines: &LineList, scan_lines: usize) -> ExtractionMatch<String> {
    let window = lines.head(scan_lines);

    let mut best: Option<(u32, &str)> = None;
    for line in window {
        if contains_any(line, VENDOR_DENYLIST) || PHONE_LABEL.is_match(line) {
            continue;
        }
        let score = score_line(line);
        if score > 0 && best.is_none_or(|(top, _)| score > top) {
            best = Some((score, line.as_str()));
        }
    }

    if let Some((score, line)) = best {
        debug!("Vendor line '{}' scored {}", line, score);
        let confidence = (score as f32 / 18.0).min(1.0);
        return ExtractionMatch::new(title_case(line), confidence, line);
    }

    let fallback = window.iter().find(|line| {
        let len = line.chars().count();
        !line.chars().any(|c| c.is_ascii_digit()) && len > 3 && len < 30
    });

    match fallback {
        Some(line) => {
            debug!("Vendor fallback to '{}'", line);
            ExtractionMatch::new(title_case(line), 0.2, line.as_str())
        }
        None => ExtractionMatch::new(UNKNOWN_VENDOR.to_string(), 0.0, ""),
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
