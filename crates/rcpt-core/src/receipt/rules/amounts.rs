//! Total and tax extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::lines::LineList;
use super::patterns::{DECIMAL_TOKEN, PRICE_TOKEN, SUBTOTAL_LABEL, TAX_LABEL, TOTAL_LABEL};
use super::{ExtractionMatch, FieldExtractor};

/// Monetary token extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DECIMAL_TOKEN
            .find_iter(text)
            .filter_map(|m| {
                parse_amount(m.as_str()).map(|amount| {
                    ExtractionMatch::new(amount, 0.8, m.as_str()).with_position(m.start(), m.end())
                })
            })
            .collect()
    }
}

/// Totals found on a receipt.
#[derive(Debug, Clone, Default)]
pub struct ReceiptAmounts {
    pub total: Option<ExtractionMatch<Decimal>>,
    pub tax: Option<ExtractionMatch<Decimal>>,
    /// True when `tax` was derived from the total rather than read.
    pub tax_estimated: bool,
}

impl ReceiptAmounts {
    pub fn total_or_zero(&self) -> Decimal {
        self.total.as_ref().map(|m| m.value).unwrap_or(Decimal::ZERO)
    }

    pub fn tax_or_zero(&self) -> Decimal {
        self.tax.as_ref().map(|m| m.value).unwrap_or(Decimal::ZERO)
    }
}

/// Extract total and tax from receipt lines.
///
/// `tax_rate` is applied to the total when no tax line is printed.
pub fn extract_amounts(lines: &LineList, tax_rate: Decimal) -> ReceiptAmounts {
    let extractor = AmountExtractor::new();
    let mut result = ReceiptAmounts::default();

    // Labeled total, never a subtotal
    result.total = labeled_max(lines, &extractor, |line| {
        TOTAL_LABEL.is_match(line) && !SUBTOTAL_LABEL.is_match(line)
    });

    if result.total.is_none() {
        result.total = labeled_max(lines, &extractor, |line| SUBTOTAL_LABEL.is_match(line))
            .map(|m| ExtractionMatch { confidence: 0.7, ..m });
    }

    // Largest price-shaped number anywhere
    if result.total.is_none() {
        result.total = lines
            .iter()
            .flat_map(|line| PRICE_TOKEN.find_iter(line).collect::<Vec<_>>())
            .filter_map(|m| {
                parse_amount(m.as_str()).map(|v| ExtractionMatch::new(v, 0.4, m.as_str()))
            })
            .max_by(|a, b| a.value.cmp(&b.value));
    }

    result.tax = lines
        .iter()
        .filter(|line| TAX_LABEL.is_match(line))
        .filter_map(|line| extractor.extract(line))
        .max_by(|a, b| a.value.cmp(&b.value))
        .map(|m| ExtractionMatch { confidence: 0.9, ..m });

    let total = result.total_or_zero();
    if result.tax_or_zero().is_zero() && total > Decimal::ZERO {
        if let Some(estimate) = estimate_tax(total, tax_rate) {
            result.tax = Some(ExtractionMatch::new(estimate, 0.3, "estimated"));
            result.tax_estimated = true;
        }
    }

    result
}

/// `total * rate` rounded to cents; `None` if the product overflows.
pub fn estimate_tax(total: Decimal, rate: Decimal) -> Option<Decimal> {
    total.checked_mul(rate).map(|tax| tax.round_dp(2))
}

/// Largest token on lines accepted by `is_label`, reading the following line
/// when the label line itself carries no number.
fn labeled_max(
    lines: &LineList,
    extractor: &AmountExtractor,
    is_label: impl Fn(&str) -> bool,
) -> Option<ExtractionMatch<Decimal>> {
    let mut best: Option<ExtractionMatch<Decimal>> = None;

    for (i, line) in lines.iter().enumerate() {
        if !is_label(line) {
            continue;
        }

        let found = extractor
            .extract(line)
            .or_else(|| lines.get(i + 1).and_then(|next| extractor.extract(next)));

        if let Some(found) = found {
            if best.as_ref().is_none_or(|b| found.value > b.value) {
                best = Some(ExtractionMatch { confidence: 0.95, ..found });
            }
        }
    }

    best
}

/// Parse a monetary token ("45.67", "12,50", "1,234.56").
///
/// A lone comma is a decimal separator; when both separators appear the
/// comma groups thousands.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };

    Decimal::from_str(&normalized).ok()
}
