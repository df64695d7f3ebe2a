//! Client for the OCR.space image-to-text API.

use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use tracing::{debug, info};

use rcpt_core::models::config::OcrConfig;
use rcpt_core::{OcrError, OcrOutput};

/// OCR API client.
pub struct OcrApiClient {
    client: reqwest::Client,
    config: OcrConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrApiClient {
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        if config.api_key.trim().is_empty() {
            return Err(OcrError::Request(
                "no OCR API key configured (set ocr.api_key)".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Send an image file to the service and return its text.
    pub async fn recognize(&self, image: &Path) -> Result<OcrOutput, OcrError> {
        let bytes = std::fs::read(image)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", image.display(), e)))?;
        if bytes.is_empty() {
            return Err(OcrError::InvalidImage(format!("{} is empty", image.display())));
        }

        let data_uri = format!("data:{};base64,{}", mime_type(image), BASE64.encode(&bytes));
        let engine = self.config.engine.to_string();
        let form = [
            ("apikey", self.config.api_key.as_str()),
            ("language", self.config.language.as_str()),
            ("isOverlayRequired", "false"),
            ("base64Image", data_uri.as_str()),
            ("OCREngine", engine.as_str()),
        ];

        info!("Sending {} ({} bytes) to OCR API", image.display(), bytes.len());

        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::Request("OCR request timed out".to_string())
                } else {
                    OcrError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("OCR API answered with {} bytes", body.len());
        parse_response(&body)
    }
}

/// Turn the service's JSON body into an [`OcrOutput`].
///
/// Processing errors reported by the service become `OcrOutput::error`, so the
/// pipeline takes its empty-input path instead of failing.
pub fn parse_response(body: &str) -> Result<OcrOutput, OcrError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "OCR processing error".to_string(),
        };
        return Ok(OcrOutput::failed(message));
    }

    match response.parsed_results.into_iter().next() {
        Some(result) => Ok(OcrOutput::from_text(result.parsed_text)),
        None => Ok(OcrOutput::failed("no parsed results")),
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "ParsedResults": [{ "ParsedText": "STARBUCKS\r\nTOTAL 4.50\r\n", "FileParseExitCode": 1 }],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false
        }"#;
        let output = parse_response(body).unwrap();
        assert_eq!(output.raw_text(), "STARBUCKS\r\nTOTAL 4.50\r\n");
        assert!(output.error.is_none());
    }

    #[test]
    fn test_parse_processing_error() {
        let body = r#"{
            "OCRExitCode": 99,
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Unable to recognize the file type", "E216"]
        }"#;
        let output = parse_response(body).unwrap();
        assert_eq!(output.error.as_deref(), Some("Unable to recognize the file type; E216"));
        assert_eq!(output.raw_text(), "");
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(matches!(
            parse_response("<html>"),
            Err(OcrError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(OcrApiClient::from_config(&OcrConfig::default()).is_err());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("receipt")), "image/jpeg");
    }
}
