//! Per-type extraction of vendor-defined fields.
//!
//! Each enabled, non-common field is resolved independently against the
//! line list; fields never see each other's results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::amounts::AmountExtractor;
use super::dates::DateExtractor;
use super::lines::LineList;
use super::patterns::{ITEM_HEADER_WORDS, NON_WORD_RUN};
use super::FieldExtractor;
use crate::models::config::DateOrder;
use crate::models::receipt::{parse_bool, Category, FieldValue};
use crate::models::vendor::{FieldSchema, FieldType, Vendor};

/// Receipt-level facts shared by every field.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub lines: &'a LineList,
    pub category: Category,
    pub reference_date: NaiveDate,
    pub date_order: DateOrder,
    pub tail_scan_lines: usize,
}

/// Extract a value for every enabled custom field of `vendor`.
///
/// Common fields are skipped; the dedicated stages produce those.
pub fn extract_custom_fields(vendor: &Vendor, ctx: &FieldContext<'_>) -> BTreeMap<String, FieldValue> {
    vendor
        .enabled_fields()
        .filter(|field| !field.common)
        .map(|field| {
            let value = extract_field(field, ctx);
            debug!("Custom field '{}' = {}", field.key, value);
            (field.key.clone(), value)
        })
        .collect()
}

/// Resolve a single field.
pub fn extract_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> FieldValue {
    match field.field_type {
        FieldType::Amount | FieldType::Number => FieldValue::Number(numeric_field(field, ctx)),
        FieldType::Text => FieldValue::Text(text_field(field, ctx)),
        FieldType::Date => FieldValue::Date(date_field(field, ctx)),
        FieldType::Category => FieldValue::Text(category_field(field, ctx)),
        FieldType::Boolean => FieldValue::Bool(boolean_field(field, ctx)),
    }
}

fn numeric_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> Decimal {
    let extractor = AmountExtractor::new();
    let lines = ctx.lines;
    let first_token = |i: usize| lines.get(i).and_then(|l| extractor.extract(l)).map(|m| m.value);

    if let Some((i, offset)) = find_label_line(lines, field) {
        let after_label = lines
            .get(i)
            .and_then(|l| l.get(offset..))
            .and_then(|rest| extractor.extract(rest))
            .map(|m| m.value);
        let found = after_label
            .or_else(|| first_token(i))
            .or_else(|| first_token(i + 1))
            .or_else(|| i.checked_sub(1).and_then(first_token));
        if let Some(value) = found {
            return value;
        }
    }

    if let Some(value) = partial_label_lines(lines, field).find_map(first_token) {
        return value;
    }

    // Bottom-up over the tail of the receipt
    let tail = lines.tail_start(ctx.tail_scan_lines);
    if let Some(value) = (tail..lines.len()).rev().find_map(first_token) {
        return value;
    }

    field
        .default_value
        .as_deref()
        .and_then(super::amounts::parse_amount)
        .unwrap_or(Decimal::ZERO)
}

fn text_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> String {
    let lines = ctx.lines;

    if is_item_field(field) {
        let header = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            ITEM_HEADER_WORDS.iter().any(|w| lower.contains(w))
        });
        if let Some(header) = header {
            let item = lines
                .iter()
                .skip(header + 1)
                .find(|line| !line.starts_with(|c: char| c.is_ascii_digit()));
            if let Some(item) = item {
                return clean_text(item);
            }
        }
    }

    if let Some((i, _)) = find_label_line(lines, field) {
        if let Some(text) = text_near(lines, i) {
            return text;
        }
    }

    if let Some(text) = partial_label_lines(lines, field).find_map(|i| text_near(lines, i)) {
        return text;
    }

    field.default_value.clone().unwrap_or_default()
}

fn date_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> NaiveDate {
    let extractor = DateExtractor::new(ctx.date_order);
    let lines = ctx.lines;

    find_label_line(lines, field)
        .and_then(|(i, _)| lines.get(i))
        .and_then(|line| extractor.extract(line))
        .or_else(|| lines.iter().find_map(|line| extractor.extract(line)))
        .map(|m| m.value)
        .unwrap_or(ctx.reference_date)
}

fn category_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> String {
    match (&field.default_value, ctx.category) {
        (Some(default), Category::Other) if !default.trim().is_empty() => default.clone(),
        (_, category) => category.label().to_string(),
    }
}

fn boolean_field(field: &FieldSchema, ctx: &FieldContext<'_>) -> bool {
    let lines = ctx.lines;

    if let Some((i, offset)) = find_label_line(lines, field) {
        let rest = lines.get(i).and_then(|l| l.get(offset..)).unwrap_or("");
        let explicit = NON_WORD_RUN
            .split(rest)
            .filter(|w| !w.is_empty())
            .find_map(parse_bool);
        // Also catch a bare checkmark, which is not a word character
        let checked = rest.contains('✓');
        return explicit.unwrap_or(true) || checked;
    }

    field
        .default_value
        .as_deref()
        .and_then(parse_bool)
        .unwrap_or(false)
}

/// First line containing the field's label (or its key read as words),
/// with the byte offset just past the label.
fn find_label_line(lines: &LineList, field: &FieldSchema) -> Option<(usize, usize)> {
    let needles = [field.label.to_lowercase(), field.key.replace('_', " ")];

    lines.iter().enumerate().find_map(|(i, line)| {
        let lower = line.to_lowercase();
        needles
            .iter()
            .filter(|n| !n.trim().is_empty())
            .find_map(|n| lower.find(n.as_str()).map(|pos| (i, pos + n.len())))
            // Lowercasing can shift byte offsets; fall back to the whole line
            .map(|(i, end)| if line.is_char_boundary(end) { (i, end) } else { (i, 0) })
    })
}

/// Indices of lines containing any label word longer than two characters.
fn partial_label_lines<'a>(
    lines: &'a LineList,
    field: &FieldSchema,
) -> impl Iterator<Item = usize> + 'a {
    let words: Vec<String> = NON_WORD_RUN
        .split(&field.label.to_lowercase())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect();

    lines.iter().enumerate().filter_map(move |(i, line)| {
        let lower = line.to_lowercase();
        words.iter().any(|w| lower.contains(w.as_str())).then_some(i)
    })
}

/// Text after `:` on the label line, else the following line.
fn text_near(lines: &LineList, i: usize) -> Option<String> {
    let line = lines.get(i)?;
    let candidate = match line.split_once(':') {
        Some((_, rest)) if !rest.trim().is_empty() => clean_text(rest),
        _ => lines.get(i + 1).map(clean_text).unwrap_or_default(),
    };
    (!candidate.is_empty()).then_some(candidate)
}

fn clean_text(s: &str) -> String {
    NON_WORD_RUN.replace_all(s, " ").trim().to_string()
}

fn is_item_field(field: &FieldSchema) -> bool {
    let label = field.label.to_lowercase();
    ITEM_HEADER_WORDS
        .iter()
        .any(|w| field.key.contains(w) || label.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn ctx(lines: &LineList) -> FieldContext<'_> {
        FieldContext {
            lines,
            category: Category::FoodAndDrinks,
            reference_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            date_order: DateOrder::Auto,
            tail_scan_lines: 10,
        }
    }

    fn field(name: &str, label: &str, field_type: FieldType) -> FieldSchema {
        FieldSchema::custom(name, label, field_type).unwrap()
    }

    fn value(text: &str, field: &FieldSchema) -> FieldValue {
        let lines = LineList::from_raw(text);
        extract_field(field, &ctx(&lines))
    }

    fn num(s: &str) -> FieldValue {
        FieldValue::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_amount_on_label_line() {
        let discount = field("Discount", "Discount", FieldType::Amount);
        assert_eq!(value("Coffee 4.50\nDiscount: 5.00\nTotal 20.00", &discount), num("5.00"));
    }

    #[test]
    fn test_amount_on_neighbouring_lines() {
        let tip = field("Tip", "Tip", FieldType::Amount);
        assert_eq!(value("Tip\n3.00\nTotal 23.00", &tip), num("3.00"));
        assert_eq!(value("2.50\nTip", &tip), num("2.50"));
    }

    #[test]
    fn test_amount_partial_label() {
        let fee = field("Service Fee", "Service Fee", FieldType::Amount);
        assert_eq!(value("SERVICE 1.25\nTotal 9.00", &fee), num("1.25"));
    }

    #[test]
    fn test_amount_tail_scan_is_bottom_up() {
        let points = field("Points", "Loyalty Points", FieldType::Number);
        assert_eq!(value("Item 1.00\nTotal 12.00", &points), num("12.00"));
    }

    #[test]
    fn test_amount_default() {
        let fee = field("Fee", "Fee", FieldType::Amount).with_default("1.50");
        assert_eq!(value("nothing", &fee), num("1.50"));
        let fee = field("Fee", "Fee", FieldType::Amount);
        assert_eq!(value("nothing", &fee), num("0"));
    }

    #[test]
    fn test_text_after_colon_and_next_line() {
        let server = field("Server", "Server", FieldType::Text);
        assert_eq!(value("Server: Anna-Marie!", &server), FieldValue::Text("Anna Marie".into()));
        assert_eq!(value("SERVER\nBob", &server), FieldValue::Text("Bob".into()));
    }

    #[test]
    fn test_text_item_header() {
        let item = field("Item", "Item", FieldType::Text);
        assert_eq!(
            value("DESCRIPTION   QTY\n2 x\nLatte grande\nTotal 5.00", &item),
            FieldValue::Text("Latte grande".into())
        );
    }

    #[test]
    fn test_text_default() {
        let note = field("Note", "Note", FieldType::Text).with_default("n/a");
        assert_eq!(value("TOTAL 1.00", &note), FieldValue::Text("n/a".into()));
        let note = field("Note", "Note", FieldType::Text);
        assert_eq!(value("TOTAL 1.00", &note), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_date_field() {
        let due = field("Due", "Due Date", FieldType::Date);
        let expected = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        assert_eq!(
            value("01/02/2024\nDue Date 15/07/2024", &due),
            FieldValue::Date(expected)
        );
        let first = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(value("01/02/2024", &due), FieldValue::Date(first));
        let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(value("none", &due), FieldValue::Date(reference));
    }

    #[test]
    fn test_category_field() {
        let kind = field("Kind", "Kind", FieldType::Category);
        assert_eq!(value("x", &kind), FieldValue::Text("Food & Drinks".into()));

        let lines = LineList::from_raw("x");
        let mut other = ctx(&lines);
        other.category = Category::Other;
        let kind = kind.with_default("Shopping");
        assert_eq!(extract_field(&kind, &other), FieldValue::Text("Shopping".into()));
    }

    #[test]
    fn test_boolean_field() {
        let member = field("Member", "Member", FieldType::Boolean);
        assert_eq!(value("Member: yes", &member), FieldValue::Bool(true));
        assert_eq!(value("MEMBER", &member), FieldValue::Bool(true));
        assert_eq!(value("Member: no", &member), FieldValue::Bool(false));
        assert_eq!(value("Member ✓", &member), FieldValue::Bool(true));
        assert_eq!(value("Total 1.00", &member), FieldValue::Bool(false));

        let member = member.with_default("true");
        assert_eq!(value("Total 1.00", &member), FieldValue::Bool(true));
    }

    #[test]
    fn test_disabled_and_common_fields_are_skipped() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut vendor = Vendor::new("v1", "Cafe", created);
        vendor.add_field(field("Discount", "Discount", FieldType::Amount)).unwrap();
        vendor.add_field(field("Table", "Table", FieldType::Text)).unwrap();
        vendor.toggle_field("table").unwrap();

        let lines = LineList::from_raw("Discount 2.00\nTable 7");
        let values = extract_custom_fields(&vendor, &ctx(&lines));

        assert_eq!(values.len(), 1);
        assert_eq!(values.get("discount"), Some(&num("2.00")));
    }
}
