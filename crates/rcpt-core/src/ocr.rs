//! Shape of the external OCR service's answer.
//!
//! Recognition happens outside this crate; the pipeline only consumes the
//! text the service returned.

use serde::{Deserialize, Serialize};

/// Text recognized in one image, or the reason recognition failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Raw recognized text.
    #[serde(default)]
    pub text: String,

    /// Service-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrOutput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text the pipeline should read. Empty when the service reported an error.
    pub fn raw_text(&self) -> &str {
        if self.error.is_some() { "" } else { &self.text }
    }

    pub fn is_usable(&self) -> bool {
        !self.raw_text().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hides_text() {
        let output = OcrOutput {
            text: "STARBUCKS".to_string(),
            error: Some("timeout".to_string()),
        };
        assert_eq!(output.raw_text(), "");
        assert!(!output.is_usable());
        assert!(OcrOutput::from_text("TOTAL 1.00").is_usable());
        assert!(!OcrOutput::from_text("  \n ").is_usable());
    }
}
