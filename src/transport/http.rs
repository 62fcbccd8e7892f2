//! HTTP adapter for the remote-task boundary.

use crate::{Error, Result};
use std::env;
use std::time::Duration;

/// Minimal JSON-POST task against one provider endpoint. Non-success
/// responses become boundary [`Error::Remote`] values carrying the status
/// and any `Retry-After` hint, which is all the retry executor needs for
/// classification. This is deliberately not a general-purpose HTTP client;
/// providers with other request shapes supply their own task closures.
pub struct HttpTask {
    client: reqwest::Client,
    url: String,
}

impl HttpTask {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let timeout_secs = env::var("AI_RELAY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn post_json(
        &self,
        credential: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout { elapsed_ms: 0 }
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let body_text = response.text().await.unwrap_or_default();
            let message =
                error_message_from_body(&body_text).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Remote {
                status,
                message,
                retry_after_ms,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

/// Pull a human-readable message out of the common `{"error": {"message"}}`
/// body shape; fall back to the raw body when it is short and printable.
fn error_message_from_body(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Some(message.to_string());
        }
        if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        return Some(trimmed.to_string());
    }
    None
}
