use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The network-calling stages of a request, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Translation,
    Embedding,
    Retrieval,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Translation => "translation",
            Stage::Embedding => "embedding",
            Stage::Retrieval => "retrieval",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

pub const EMPTY_QUESTION_NOTICE: &str = "Please enter a question first.";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Blank input; rejected before any network call.
    #[error("{}", EMPTY_QUESTION_NOTICE)]
    EmptyQuestion,

    #[error("translation failed: {0:#}")]
    Translation(#[source] anyhow::Error),

    #[error("embedding failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    #[error("retrieval failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

impl PipelineError {
    /// The stage that failed, or `None` for input validation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::EmptyQuestion => None,
            PipelineError::Translation(_) => Some(Stage::Translation),
            PipelineError::Embedding(_) => Some(Stage::Embedding),
            PipelineError::Retrieval(_) => Some(Stage::Retrieval),
            PipelineError::Generation(_) => Some(Stage::Generation),
        }
    }

    /// Message suitable for showing to the person who asked.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::EmptyQuestion => EMPTY_QUESTION_NOTICE.to_string(),
            other => format!("An error occurred: {}", other),
        }
    }
}
