//! Purchase date extraction.

use chrono::NaiveDate;
use regex::Captures;

use super::lines::LineList;
use super::patterns::{
    month_number, DATE_DAY_MONTH_NAME, DATE_DMY_LONG, DATE_DMY_SHORT, DATE_MONTH_NAME, DATE_YMD,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::DateOrder;

/// Date extractor for a single line of text.
pub struct DateExtractor {
    order: DateOrder,
}

impl DateExtractor {
    pub fn new(order: DateOrder) -> Self {
        Self { order }
    }

    /// Resolve an ambiguous `a/b` pair into (month, day).
    fn resolve(&self, year: i32, a: u32, b: u32) -> Option<NaiveDate> {
        let day_first = NaiveDate::from_ymd_opt(year, b, a);
        let month_first = NaiveDate::from_ymd_opt(year, a, b);

        match self.order {
            DateOrder::DayFirst => day_first,
            DateOrder::MonthFirst => month_first,
            DateOrder::Auto if a > 12 => day_first,
            DateOrder::Auto => month_first.or(day_first),
        }
    }

    fn numeric(&self, caps: &Captures<'_>, year: i32) -> Option<NaiveDate> {
        let a = caps[1].parse().ok()?;
        let b = caps[2].parse().ok()?;
        self.resolve(year, a, b)
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new(DateOrder::Auto)
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Every date on the line, grouped by pattern in priority order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // D/M/YYYY, D-M-YYYY, D.M.YYYY
        for caps in DATE_DMY_LONG.captures_iter(text) {
            let date = caps[3].parse().ok().and_then(|y| self.numeric(&caps, y));
            push_unique(&mut results, date, &caps, 0.85);
        }

        // YYYY-M-D
        for caps in DATE_YMD.captures_iter(text) {
            let date = ymd_from(&caps[1], &caps[2], &caps[3]);
            push_unique(&mut results, date, &caps, 0.95);
        }

        // D/M/YY
        for caps in DATE_DMY_SHORT.captures_iter(text) {
            let date = caps[3]
                .parse::<i32>()
                .ok()
                .and_then(|y| self.numeric(&caps, 2000 + y));
            push_unique(&mut results, date, &caps, 0.7);
        }

        // Month D, YYYY
        for caps in DATE_MONTH_NAME.captures_iter(text) {
            let date = month_number(&caps[1])
                .and_then(|m| ymd_from(&caps[3], &m.to_string(), &caps[2]));
            push_unique(&mut results, date, &caps, 0.95);
        }

        // D Month YYYY
        for caps in DATE_DAY_MONTH_NAME.captures_iter(text) {
            let date = month_number(&caps[2])
                .and_then(|m| ymd_from(&caps[3], &m.to_string(), &caps[1]));
            push_unique(&mut results, date, &caps, 0.95);
        }

        results
    }
}

fn ymd_from(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn push_unique(
    results: &mut Vec<ExtractionMatch<NaiveDate>>,
    date: Option<NaiveDate>,
    caps: &Captures<'_>,
    confidence: f32,
) {
    let (Some(date), Some(whole)) = (date, caps.get(0)) else {
        return;
    };
    if results.iter().any(|r| r.value == date) {
        return;
    }
    results.push(
        ExtractionMatch::new(date, confidence, whole.as_str())
            .with_position(whole.start(), whole.end()),
    );
}

/// First date found scanning lines top to bottom.
pub fn extract_date(lines: &LineList, order: DateOrder) -> Option<ExtractionMatch<NaiveDate>> {
    let extractor = DateExtractor::new(order);
    lines.iter().find_map(|line| extractor.extract(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn first(text: &str) -> Option<NaiveDate> {
        extract_date(&LineList::from_raw(text), DateOrder::Auto).map(|m| m.value)
    }

    #[test]
    fn test_auto_order_day_first_when_unambiguous() {
        assert_eq!(first("25/12/2024"), Some(ymd(2024, 12, 25)));
        assert_eq!(first("25.12.2024"), Some(ymd(2024, 12, 25)));
    }

    #[test]
    fn test_auto_order_month_first_when_ambiguous() {
        assert_eq!(first("03/04/2024"), Some(ymd(2024, 3, 4)));
    }

    #[test]
    fn test_explicit_order() {
        let lines = LineList::from_raw("03/04/2024");
        let day_first = extract_date(&lines, DateOrder::DayFirst).unwrap();
        assert_eq!(day_first.value, ymd(2024, 4, 3));
        let month_first = extract_date(&lines, DateOrder::MonthFirst).unwrap();
        assert_eq!(month_first.value, ymd(2024, 3, 4));
    }

    #[test]
    fn test_iso_and_short_year() {
        assert_eq!(first("Date: 2024-3-5"), Some(ymd(2024, 3, 5)));
        assert_eq!(first("15-01-24"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(first("March 5, 2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(first("Sep 30 2023"), Some(ymd(2023, 9, 30)));
        assert_eq!(first("5 March 2024"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_first_line_wins() {
        assert_eq!(
            first("STORE\n01/02/2024 10:15\nRefund by 2024-12-31"),
            Some(ymd(2024, 1, 2))
        );
    }

    #[test]
    fn test_invalid_dates_are_skipped() {
        assert_eq!(first("45/45/2024"), None);
        assert_eq!(first("no date here"), None);
    }
}
