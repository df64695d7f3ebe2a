//! Spending summaries over the local receipt list.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::receipt::{Category, ReceiptRecord};

/// Calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }

    /// Short label such as "Mar 2024".
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid month '{}', expected YYYY-MM", s);
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<YearMonth> for String {
    fn from(month: YearMonth) -> Self {
        month.to_string()
    }
}

/// Spending in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub count: usize,
}

/// Spending in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: YearMonth,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub receipt_count: usize,
}

/// A month compared with the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthComparison {
    pub month: YearMonth,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub previous_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub change: Decimal,
    /// Relative change in percent; `None` when the previous month is empty.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub change_percent: Option<Decimal>,
}

fn in_month(receipts: &[ReceiptRecord], month: YearMonth) -> impl Iterator<Item = &ReceiptRecord> {
    receipts.iter().filter(move |r| month.contains(r.date))
}

/// Sum of amounts, clamped to the `Decimal` range instead of overflowing.
pub fn saturating_sum<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount))
}

pub fn monthly_total(receipts: &[ReceiptRecord], month: YearMonth) -> Decimal {
    saturating_sum(in_month(receipts, month).map(|r| &r.total_amount))
}

pub fn overall_total(receipts: &[ReceiptRecord]) -> Decimal {
    saturating_sum(receipts.iter().map(|r| &r.total_amount))
}

pub fn month_comparison(receipts: &[ReceiptRecord], month: YearMonth) -> MonthComparison {
    let total = monthly_total(receipts, month);
    let previous_total = monthly_total(receipts, month.previous());
    let change = total.saturating_sub(previous_total);
    // No percentage when the ratio does not fit
    let change_percent = change
        .checked_div(previous_total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(1));

    MonthComparison {
        month,
        total,
        previous_total,
        change,
        change_percent,
    }
}

/// Spending per category for a month, largest first.
pub fn category_breakdown(receipts: &[ReceiptRecord], month: YearMonth) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for receipt in in_month(receipts, month) {
        let entry = totals.entry(receipt.category).or_default();
        entry.0 = entry.0.saturating_add(receipt.total_amount);
        entry.1 += 1;
    }

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal { category, amount, count })
        .collect();
    // Stable sort keeps category order for equal amounts
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));
    breakdown
}

/// Totals for the `count` months ending at `end`, oldest first.
pub fn monthly_trend(receipts: &[ReceiptRecord], end: YearMonth, count: usize) -> Vec<MonthTotal> {
    let mut months = Vec::with_capacity(count);
    let mut month = end;
    for _ in 0..count {
        months.push(month);
        month = month.previous();
    }
    months.reverse();

    months
        .into_iter()
        .map(|month| MonthTotal {
            month,
            label: month.label(),
            total: monthly_total(receipts, month),
            receipt_count: in_month(receipts, month).count(),
        })
        .collect()
}

/// Months that have at least one receipt, newest first.
pub fn available_months(receipts: &[ReceiptRecord]) -> Vec<YearMonth> {
    let mut months: Vec<YearMonth> = receipts.iter().map(|r| YearMonth::of(r.date)).collect();
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    months
}

/// Everything the summary screen shows for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    pub comparison: MonthComparison,
    pub categories: Vec<CategoryTotal>,
    pub trend: Vec<MonthTotal>,
    pub available_months: Vec<YearMonth>,
    #[serde(with = "rust_decimal::serde::float")]
    pub overall_total: Decimal,
    pub receipt_count: usize,
}

impl SpendingSummary {
    pub fn build(receipts: &[ReceiptRecord], month: YearMonth, trend_months: usize) -> Self {
        Self {
            comparison: month_comparison(receipts, month),
            categories: category_breakdown(receipts, month),
            trend: monthly_trend(receipts, month, trend_months),
            available_months: available_months(receipts),
            overall_total: overall_total(receipts),
            receipt_count: receipts.len(),
        }
    }
}
