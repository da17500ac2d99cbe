//! Builds the pipeline's backends from configuration. This is the only place
//! that knows which vendor sits behind each stage.

use anyhow::Result;

use crate::config::{AppConfig, ResponderConfig, RetrieverConfig};
use index::{
    AstraRetriever, Embedder, OpenAiEmbedder, PineconeRetriever, QdrantRetriever, Retriever,
    TruncatedEmbedder,
};
use query::{ChatCompletionsResponder, OllamaResponder, OpenAiResponder, Pipeline, Responder};
use translate::{GoogleTranslator, Translator};

pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let pipeline = Pipeline::new(
        build_translator(config)?,
        build_embedder(config)?,
        build_retriever(config)?,
        build_responder(config)?,
        config.pipeline_settings(),
    );

    tracing::info!(
        retriever = retriever_kind(&config.retriever),
        responder = responder_kind(&config.responder),
        top_k = config.top_k,
        "Pipeline ready"
    );

    Ok(pipeline)
}

fn require(value: &str, env_var: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{} is not set", env_var);
    }
    Ok(())
}

fn build_translator(config: &AppConfig) -> Result<Box<dyn Translator>> {
    let translator = GoogleTranslator::new(
        config.translator.base_url.clone(),
        config.timeouts.translate(),
    )?;
    Ok(Box::new(translator))
}

fn build_embedder(config: &AppConfig) -> Result<Box<dyn Embedder>> {
    let embedder = &config.embedder;
    require(&embedder.api_key, "OPENAI_API_KEY")?;

    let client = OpenAiEmbedder::new(
        embedder.base_url.clone(),
        embedder.api_key.clone(),
        embedder.model.clone(),
        config.timeouts.embed(),
    )?;

    Ok(match embedder.truncate_to {
        Some(dims) => Box::new(TruncatedEmbedder::new(client, dims)),
        None => Box::new(client),
    })
}

fn build_retriever(config: &AppConfig) -> Result<Box<dyn Retriever>> {
    let timeout = config.timeouts.retrieve();

    Ok(match &config.retriever {
        RetrieverConfig::Pinecone {
            index_host,
            api_key,
            text_field,
        } => {
            require(index_host, "PINECONE_INDEX_HOST")?;
            require(api_key, "PINECONE_API_KEY")?;
            Box::new(PineconeRetriever::new(
                index_host.clone(),
                api_key.clone(),
                text_field.clone(),
                timeout,
            )?)
        }
        RetrieverConfig::Astra {
            api_endpoint,
            keyspace,
            collection,
            token,
            text_field,
        } => {
            require(api_endpoint, "ASTRA_API_ENDPOINT")?;
            require(token, "ASTRA_TOKEN")?;
            Box::new(AstraRetriever::new(
                api_endpoint.clone(),
                keyspace.clone(),
                collection.clone(),
                token.clone(),
                text_field.clone(),
                timeout,
            )?)
        }
        RetrieverConfig::Qdrant {
            base_url,
            collection,
            api_key,
            text_field,
        } => Box::new(QdrantRetriever::new(
            base_url.clone(),
            collection.clone(),
            api_key.clone(),
            text_field.clone(),
            timeout,
        )?),
    })
}

fn build_responder(config: &AppConfig) -> Result<Box<dyn Responder>> {
    let timeout = config.timeouts.generate();

    Ok(match &config.responder {
        ResponderConfig::OpenAi {
            base_url,
            model,
            api_key,
        } => {
            require(api_key, "OPENAI_API_KEY")?;
            Box::new(OpenAiResponder::new(
                base_url.clone(),
                api_key.clone(),
                model.clone(),
                timeout,
            )?)
        }
        ResponderConfig::ChatCompletions {
            url,
            model,
            api_key,
        } => {
            require(api_key, "OPENROUTER_API_KEY")?;
            Box::new(ChatCompletionsResponder::new(
                url.clone(),
                api_key.clone(),
                model.clone(),
                timeout,
            )?)
        }
        ResponderConfig::Ollama { base_url, model } => {
            Box::new(OllamaResponder::new(base_url.clone(), model.clone(), timeout)?)
        }
    })
}

fn retriever_kind(config: &RetrieverConfig) -> &'static str {
    match config {
        RetrieverConfig::Pinecone { .. } => "pinecone",
        RetrieverConfig::Astra { .. } => "astra",
        RetrieverConfig::Qdrant { .. } => "qdrant",
    }
}

fn responder_kind(config: &ResponderConfig) -> &'static str {
    match config {
        ResponderConfig::OpenAi { .. } => "openai",
        ResponderConfig::ChatCompletions { .. } => "chat_completions",
        ResponderConfig::Ollama { .. } => "ollama",
    }
}
