use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use query::{Languages, PipelineSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub languages: Languages,
    pub top_k: usize,
    pub namespace: Option<String>,
    pub timeouts: TimeoutConfig,
    pub translator: TranslatorConfig,
    pub embedder: EmbedderConfig,
    pub retriever: RetrieverConfig,
    pub responder: ResponderConfig,
    pub display: DisplayConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub translate_secs: u64,
    pub embed_secs: u64,
    pub retrieve_secs: u64,
    pub generate_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Keep only this many leading components. Only for indexes built with
    /// truncated vectors; lossy.
    pub truncate_to: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrieverConfig {
    Pinecone {
        #[serde(default)]
        index_host: String,
        #[serde(default, skip_serializing)]
        api_key: String,
        #[serde(default = "default_text_field")]
        text_field: String,
    },
    Astra {
        #[serde(default)]
        api_endpoint: String,
        #[serde(default = "default_keyspace")]
        keyspace: String,
        collection: String,
        #[serde(default, skip_serializing)]
        token: String,
        #[serde(default = "default_text_field")]
        text_field: String,
    },
    Qdrant {
        #[serde(default = "default_qdrant_url")]
        base_url: String,
        collection: String,
        #[serde(default, skip_serializing)]
        api_key: Option<String>,
        #[serde(default = "default_text_field")]
        text_field: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponderConfig {
    #[serde(rename = "openai")]
    OpenAi {
        #[serde(default = "default_openai_url")]
        base_url: String,
        #[serde(default = "default_openai_chat_model")]
        model: String,
        #[serde(default, skip_serializing)]
        api_key: String,
    },
    ChatCompletions {
        #[serde(default = "default_openrouter_url")]
        url: String,
        #[serde(default = "default_openrouter_model")]
        model: String,
        #[serde(default, skip_serializing)]
        api_key: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_translation: bool,
    pub show_context: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    pub filter: String,
}

fn default_text_field() -> String {
    "text".to_string()
}

fn default_keyspace() -> String {
    "default_keyspace".to_string()
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_openrouter_model() -> String {
    "google/gemma-3-12b-it:free".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            translate_secs: 30,
            embed_secs: 30,
            retrieve_secs: 30,
            generate_secs: 120,
        }
    }
}

impl TimeoutConfig {
    pub fn translate(&self) -> Duration {
        Duration::from_secs(self.translate_secs)
    }

    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    pub fn retrieve(&self) -> Duration {
        Duration::from_secs(self.retrieve_secs)
    }

    pub fn generate(&self) -> Duration {
        Duration::from_secs(self.generate_secs)
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".to_string(),
        }
    }
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_url(),
            model: "text-embedding-ada-002".to_string(),
            api_key: String::new(),
            truncate_to: None,
        }
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        RetrieverConfig::Pinecone {
            index_host: String::new(),
            api_key: String::new(),
            text_field: default_text_field(),
        }
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig::OpenAi {
            base_url: default_openai_url(),
            model: default_openai_chat_model(),
            api_key: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".to_string(),
        }
    }
}

impl Default for AppConfig {
    /// OpenAI for generation, Pinecone namespace `my-works`, top 3.
    fn default() -> Self {
        Self {
            languages: Languages::default(),
            top_k: 3,
            namespace: Some("my-works".to_string()),
            timeouts: TimeoutConfig::default(),
            translator: TranslatorConfig::default(),
            embedder: EmbedderConfig::default(),
            retriever: RetrieverConfig::default(),
            responder: ResponderConfig::default(),
            display: DisplayConfig {
                show_translation: true,
                show_context: false,
            },
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Gemma 3 through OpenRouter over the Pinecone namespace `gawdat`.
    pub fn openrouter_pinecone() -> Self {
        Self {
            top_k: 5,
            namespace: Some("gawdat".to_string()),
            responder: ResponderConfig::ChatCompletions {
                url: default_openrouter_url(),
                model: default_openrouter_model(),
                api_key: String::new(),
            },
            display: DisplayConfig {
                show_translation: true,
                show_context: true,
            },
            ..Self::default()
        }
    }

    /// Gemma 3 through OpenRouter over an Astra collection whose vectors
    /// were stored truncated to 1000 dimensions.
    pub fn openrouter_astra() -> Self {
        Self {
            top_k: 5,
            namespace: None,
            embedder: EmbedderConfig {
                truncate_to: Some(1000),
                ..EmbedderConfig::default()
            },
            retriever: RetrieverConfig::Astra {
                api_endpoint: String::new(),
                keyspace: default_keyspace(),
                collection: "book_embeddings".to_string(),
                token: String::new(),
                text_field: default_text_field(),
            },
            display: DisplayConfig {
                show_translation: false,
                show_context: true,
            },
            ..Self::openrouter_pinecone()
        }
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "openrouter_pinecone" => Ok(Self::openrouter_pinecone()),
            "openrouter_astra" => Ok(Self::openrouter_astra()),
            other => anyhow::bail!("Unknown preset '{}'", other),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// `BOOKQA_CONFIG` names a TOML file; otherwise `BOOKQA_PRESET` picks a
    /// preset. Credentials are then overlaid from `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("BOOKQA_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::preset(lookup("BOOKQA_PRESET").as_deref().unwrap_or("default"))?,
        };
        config.apply_env(lookup);
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_key = lookup("OPENAI_API_KEY");
        if let Some(key) = &openai_key {
            self.embedder.api_key = key.clone();
        }

        match &mut self.retriever {
            RetrieverConfig::Pinecone {
                index_host,
                api_key,
                ..
            } => {
                if let Some(v) = lookup("PINECONE_API_KEY") {
                    *api_key = v;
                }
                if let Some(v) = lookup("PINECONE_INDEX_HOST") {
                    *index_host = v;
                }
            }
            RetrieverConfig::Astra {
                api_endpoint,
                token,
                ..
            } => {
                if let Some(v) = lookup("ASTRA_TOKEN") {
                    *token = v;
                }
                if let Some(v) = lookup("ASTRA_API_ENDPOINT") {
                    *api_endpoint = v;
                }
            }
            RetrieverConfig::Qdrant { api_key, .. } => {
                if let Some(v) = lookup("QDRANT_API_KEY") {
                    *api_key = Some(v);
                }
            }
        }

        match &mut self.responder {
            ResponderConfig::OpenAi { api_key, .. } => {
                if let Some(key) = openai_key {
                    *api_key = key;
                }
            }
            ResponderConfig::ChatCompletions { api_key, .. } => {
                if let Some(v) = lookup("OPENROUTER_API_KEY") {
                    *api_key = v;
                }
            }
            ResponderConfig::Ollama { .. } => {}
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            languages: self.languages.clone(),
            top_k: self.top_k,
            namespace: self.namespace.clone().filter(|ns| !ns.is_empty()),
        }
    }
}
