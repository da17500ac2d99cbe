use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::retriever::{RetrievalQuery, Retriever, ranked};
use crate::Passage;

/// Pinecone data-plane client (namespaced similarity query).
pub struct PineconeRetriever {
    index_host: String,
    api_key: String,
    text_field: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    #[serde(default)]
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeRetriever {
    pub fn new(
        index_host: String,
        api_key: String,
        text_field: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Pinecone HTTP client")?;

        Ok(Self {
            index_host,
            api_key,
            text_field,
            client,
        })
    }
}

impl Retriever for PineconeRetriever {
    fn retrieve(&self, query: &RetrievalQuery<'_>) -> Result<Vec<Passage>> {
        let url = format!("{}/query", self.index_host.trim_end_matches('/'));

        let body = QueryRequest {
            vector: query.vector,
            top_k: query.top_k,
            include_metadata: true,
            namespace: query.namespace.filter(|ns| !ns.is_empty()),
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .context("Failed to send query to Pinecone")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Pinecone query failed: {} {}", status, error_text);
        }

        let result: QueryResponse = response
            .json()
            .context("Failed to parse Pinecone response")?;

        let texts = result.matches.into_iter().filter_map(|m| {
            let text = m
                .metadata
                .as_ref()
                .and_then(|meta| meta.get(&self.text_field))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if text.is_none() {
                tracing::debug!(id = %m.id, field = %self.text_field, "Skipping match without text");
            }
            text.map(|t| (t, m.score))
        });

        Ok(ranked(texts))
    }
}
