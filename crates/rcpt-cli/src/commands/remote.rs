//! Firebase Realtime Database REST client.
//!
//! Nodes are addressed by slash-separated paths; every path maps to
//! `{database_url}/{path}.json`.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use rcpt_core::models::config::RemoteConfig;
use rcpt_core::ReceiptRecord;

/// Remote document store client.
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RemoteStore {
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let base_url = config
            .database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .context("No remote database configured (set remote.database_url)")?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        node_url(&self.base_url, path, self.auth_token.as_deref())
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        read_json(resp, path).await
    }

    /// Replace the node at `path`.
    pub async fn set<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<()> {
        let resp = self
            .client
            .put(self.url(path))
            .json(value)
            .send()
            .await
            .with_context(|| format!("PUT {} failed", path))?;
        read_json(resp, path).await.map(|_| ())
    }

    /// Add a child under `path` with a generated key, returning the key.
    pub async fn push<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<String> {
        let resp = self
            .client
            .post(self.url(path))
            .json(value)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;
        let json = read_json(resp, path).await?;
        json["name"]
            .as_str()
            .map(str::to_string)
            .context("Push response carried no key")
    }

    /// Merge fields into the node at `path`.
    pub async fn update(&self, path: &str, fields: &Value) -> Result<()> {
        let resp = self
            .client
            .patch(self.url(path))
            .json(fields)
            .send()
            .await
            .with_context(|| format!("PATCH {} failed", path))?;
        read_json(resp, path).await.map(|_| ())
    }

    pub async fn remove(&self, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", path))?;
        read_json(resp, path).await.map(|_| ())
    }
}

async fn read_json(resp: reqwest::Response, path: &str) -> Result<Value> {
    let status = resp.status();
    let text = resp.text().await.context("Failed to read remote response")?;
    debug!("Remote {} -> {} ({} bytes)", path, status, text.len());

    if !status.is_success() {
        anyhow::bail!("Remote store returned {} for {}: {}", status, path, text);
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).context("Failed to parse remote JSON")
}

/// REST URL of a node.
pub fn node_url(base_url: &str, path: &str, auth: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_matches('/');
    match auth {
        Some(token) => format!("{}/{}.json?auth={}", base, path, token),
        None => format!("{}/{}.json", base, path),
    }
}

/// Collection a receipt is pushed to: its vendor's table, or the shared
/// list when no vendor matched.
pub fn receipt_collection(record: &ReceiptRecord) -> String {
    match &record.matched_vendor {
        Some(vendor) => format!("vendor_data/{}", vendor.id),
        None => "receipts".to_string(),
    }
}

/// Document written for a scanned receipt: the flattened record marked as
/// scanned.
pub fn receipt_document(record: &ReceiptRecord) -> Value {
    let mut doc = record.flattened();
    doc.remove("firebase_id");
    doc.insert("scanned".to_string(), Value::Bool(true));
    Value::Object(doc)
}
