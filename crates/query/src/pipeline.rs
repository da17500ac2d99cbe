use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use crate::error::PipelineError;
use crate::llm::Responder;
use crate::prompt::{self, Languages};
use index::{Embedder, Passage, RetrievalQuery, Retriever};
use translate::Translator;

/// Per-deployment knobs the stages need at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub languages: Languages,
    pub top_k: usize,
    pub namespace: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            languages: Languages::default(),
            top_k: 3,
            namespace: Some("my-works".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub translated_query: String,
    pub passages: Vec<Passage>,
    pub context: String,
    pub answer: String,
    pub trace: AnswerTrace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerTrace {
    pub embedding_dims: usize,
    pub passages_retrieved: usize,
    pub context_chars: usize,
    pub translate_ms: u64,
    pub embed_ms: u64,
    pub retrieve_ms: u64,
    pub generate_ms: u64,
    pub total_ms: u64,
}

/// Translate, embed, retrieve, compose, generate: strictly in that order for
/// each call, and the first failure ends the request.
///
/// Backends hold only configuration-derived clients, so one pipeline can be
/// shared by concurrent requests.
pub struct Pipeline {
    translator: Box<dyn Translator>,
    embedder: Box<dyn Embedder>,
    retriever: Box<dyn Retriever>,
    responder: Box<dyn Responder>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        translator: Box<dyn Translator>,
        embedder: Box<dyn Embedder>,
        retriever: Box<dyn Retriever>,
        responder: Box<dyn Responder>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            translator,
            embedder,
            retriever,
            responder,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Answer `question`, asked in the source language.
    ///
    /// Blocks the calling thread for the whole run.
    pub fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let span = info_span!("ask", request_id = %uuid::Uuid::new_v4());
        let _guard = span.enter();
        let started = Instant::now();
        let mut trace = AnswerTrace::default();
        let languages = &self.settings.languages;

        let timer = Instant::now();
        let translated_query = translate::translate_blocking(
            self.translator.as_ref(),
            question,
            &languages.source.code,
            &languages.target.code,
        )
        .map_err(PipelineError::Translation)
        .inspect_err(log_failure)?;
        trace.translate_ms = timer.elapsed().as_millis() as u64;
        debug!(elapsed_ms = trace.translate_ms, query = %translated_query, "Translated");

        let timer = Instant::now();
        let vector = self
            .embedder
            .embed(&translated_query)
            .map_err(PipelineError::Embedding)
            .inspect_err(log_failure)?;
        trace.embed_ms = timer.elapsed().as_millis() as u64;
        trace.embedding_dims = vector.len();
        debug!(elapsed_ms = trace.embed_ms, dims = vector.len(), "Embedded");

        let timer = Instant::now();
        let passages = self
            .retriever
            .retrieve(&RetrievalQuery {
                vector: &vector,
                top_k: self.settings.top_k,
                namespace: self.settings.namespace.as_deref(),
            })
            .map_err(PipelineError::Retrieval)
            .inspect_err(log_failure)?;
        trace.retrieve_ms = timer.elapsed().as_millis() as u64;
        trace.passages_retrieved = passages.len();
        debug!(elapsed_ms = trace.retrieve_ms, passages = passages.len(), "Retrieved");

        if passages.is_empty() {
            warn!("No passages matched; answering without context");
        }

        let context = prompt::build_context(passages.iter().map(|p| p.text.as_str()));
        trace.context_chars = context.chars().count();
        let prompt = prompt::build_answer_prompt(&context, &translated_query, languages);

        let timer = Instant::now();
        let answer = self
            .responder
            .respond(&prompt)
            .map_err(PipelineError::Generation)
            .inspect_err(log_failure)?;
        trace.generate_ms = timer.elapsed().as_millis() as u64;
        trace.total_ms = started.elapsed().as_millis() as u64;

        info!(
            total_ms = trace.total_ms,
            passages = trace.passages_retrieved,
            "Answered question"
        );

        Ok(Answer {
            question: question.to_string(),
            translated_query,
            passages,
            context,
            answer,
            trace,
        })
    }
}

fn log_failure(err: &PipelineError) {
    if let Some(stage) = err.stage() {
        warn!(%stage, error = %err, "Request aborted");
    }
}
