use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

/// A remote text-generation service answering a single composed prompt.
pub trait Responder: Send + Sync {
    fn respond(&self, prompt: &str) -> Result<String>;
}

fn blocking_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build generation HTTP client")
}

/// Pull a human-readable message out of an error body if the provider sent
/// one, otherwise return the raw body.
fn provider_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// OpenAI chat completions with typed request and response bodies.
#[derive(Clone)]
pub struct OpenAiResponder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiResponder {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url,
            api_key,
            model,
            client: blocking_client(timeout)?,
        })
    }
}

impl Responder for OpenAiResponder {
    fn respond(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("OpenAI request failed: {} {}", status, provider_error_detail(&body));
        }

        let chat: ChatResponse = response
            .json()
            .context("Failed to parse OpenAI response")?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("OpenAI response contained no answer")
    }
}

/// Any chat-completions endpoint (OpenRouter and friends) called with a raw
/// JSON body; the answer is read from `choices[0].message.content`.
#[derive(Clone)]
pub struct ChatCompletionsResponder {
    url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsResponder {
    pub fn new(url: String, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url,
            api_key,
            model,
            client: blocking_client(timeout)?,
        })
    }
}

impl Responder for ChatCompletionsResponder {
    fn respond(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .context("Failed to send chat completion request")?;

        let status = response.status();
        let text = response
            .text()
            .context("Failed to read chat completion response")?;

        if !status.is_success() {
            anyhow::bail!(
                "Chat completion request failed: {} {}",
                status,
                provider_error_detail(&text)
            );
        }

        let result: Value =
            serde_json::from_str(&text).context("Failed to parse chat completion response")?;

        // Some providers report upstream failures in a 200 body.
        if let Some(message) = result["error"]["message"].as_str() {
            anyhow::bail!("Chat completion request failed: {}", message);
        }

        result["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("Malformed chat completion response: missing choices[0].message.content")
    }
}

/// Local Ollama `/api/generate`.
#[derive(Clone)]
pub struct OllamaResponder {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaResponder {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url,
            model,
            client: blocking_client(timeout)?,
        })
    }
}

impl Responder for OllamaResponder {
    fn respond(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }
}
