//! Rule-based field extractors for receipt text.

pub mod amounts;
pub mod category;
pub mod custom_fields;
pub mod dates;
pub mod lines;
pub mod patterns;
pub mod vendor_name;

pub use amounts::{estimate_tax, extract_amounts, parse_amount, AmountExtractor, ReceiptAmounts};
pub use category::classify_category;
pub use custom_fields::extract_custom_fields;
pub use dates::{extract_date, DateExtractor};
pub use lines::LineList;
pub use vendor_name::{extract_vendor_name, title_case};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
