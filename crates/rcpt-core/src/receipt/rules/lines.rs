//! Text normalization: raw OCR output into an ordered line list.

/// Ordered, trimmed, non-empty lines of one receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineList {
    lines: Vec<String>,
}

impl LineList {
    /// Split raw OCR text on newlines, trimming and dropping blank lines.
    pub fn from_raw(raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// The first `n` lines.
    pub fn head(&self, n: usize) -> &[String] {
        &self.lines[..n.min(self.lines.len())]
    }

    /// Index of the first of the last `n` lines.
    pub fn tail_start(&self, n: usize) -> usize {
        self.lines.len().saturating_sub(n)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }
}
