use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::vector;

/// Turns text into a fixed-length vector via a remote embedding service.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// OpenAI-compatible `/embeddings` client.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build embedding HTTP client")?;

        Ok(Self {
            base_url,
            api_key,
            model,
            client,
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("Failed to send embedding request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            anyhow::bail!("Embedding request failed: {} {}", status, error_text);
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .context("Failed to parse embedding response")?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("Embedding response contained no vectors")
    }
}

/// Wraps an embedder and keeps only the first `dims` components of every
/// vector. See [`vector::truncate`] for why this is lossy.
pub struct TruncatedEmbedder<E> {
    inner: E,
    dims: usize,
}

impl<E: Embedder> TruncatedEmbedder<E> {
    pub fn new(inner: E, dims: usize) -> Self {
        tracing::warn!(
            dims,
            "Embedding truncation enabled; query vectors are cut, not projected"
        );
        Self { inner, dims }
    }
}

impl<E: Embedder> Embedder for TruncatedEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let full = self.inner.embed(text)?;
        vector::truncate(full, self.dims)
    }
}
