pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use error::{EMPTY_QUESTION_NOTICE, PipelineError, Stage};
pub use llm::{ChatCompletionsResponder, OllamaResponder, OpenAiResponder, Responder};
pub use pipeline::{Answer, AnswerTrace, Pipeline, PipelineSettings};
pub use prompt::{Language, Languages};
