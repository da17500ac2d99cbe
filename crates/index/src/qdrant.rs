use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::time::Duration;

use crate::retriever::{RetrievalQuery, Retriever, ranked};
use crate::Passage;

/// Qdrant collection searched over the REST API.
pub struct QdrantRetriever {
    base_url: String,
    collection_name: String,
    api_key: Option<String>,
    text_field: String,
    client: reqwest::blocking::Client,
}

impl QdrantRetriever {
    pub fn new(
        base_url: String,
        collection_name: String,
        api_key: Option<String>,
        text_field: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Qdrant HTTP client")?;

        Ok(Self {
            base_url,
            collection_name,
            api_key,
            text_field,
            client,
        })
    }

    fn search_body(query: &RetrievalQuery<'_>) -> Value {
        let mut body = json!({
            "vector": query.vector,
            "limit": query.top_k,
            "with_payload": true
        });

        if let Some(ns) = query.namespace.filter(|ns| !ns.is_empty()) {
            body["filter"] = json!({
                "must": [{ "key": "namespace", "match": { "value": ns } }]
            });
        }

        body
    }
}

impl Retriever for QdrantRetriever {
    fn retrieve(&self, query: &RetrievalQuery<'_>) -> Result<Vec<Passage>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection_name
        );

        let mut request = self.client.post(&url).json(&Self::search_body(query));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .context("Failed to send search request to Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Qdrant search failed: {}", error_text);
        }

        let result: Value = response
            .json()
            .context("Failed to parse Qdrant response")?;

        let points = result["result"]
            .as_array()
            .context("Invalid Qdrant response format")?;

        let texts = points.iter().filter_map(|point| {
            let score = point["score"].as_f64().map(|s| s as f32);
            let text = point["payload"]
                .get(&self.text_field)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if text.is_none() {
                tracing::debug!(id = %point["id"], "Skipping point without text");
            }
            text.map(|t| (t, score))
        });

        Ok(ranked(texts))
    }
}
