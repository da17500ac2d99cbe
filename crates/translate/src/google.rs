use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::Translator;

/// Client for the public Google Translate `translate_a/single` endpoint.
#[derive(Clone)]
pub struct GoogleTranslator {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        // Each call runs on its own short-lived runtime; pooled connections
        // would be bound to a runtime that no longer exists.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn default() -> Result<Self> {
        Self::new(
            "https://translate.googleapis.com".to_string(),
            Duration::from_secs(30),
        )
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("Failed to send translation request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Translation request failed: {} {}", status, error_text);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse translation response")?;

        let translated = parse_segments(&body)?;
        tracing::debug!(source, target, chars = translated.len(), "Translated query");
        Ok(translated)
    }
}

/// The endpoint answers with `[[["translated", "original", ...], ...], ...]`;
/// long inputs come back split into several segments.
fn parse_segments(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .context("Malformed translation response: missing segment list")?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(|v| v.as_str()) {
            translated.push_str(piece);
        }
    }

    if translated.trim().is_empty() {
        anyhow::bail!("Malformed translation response: no translated text");
    }

    Ok(translated)
}
