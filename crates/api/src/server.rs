use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::DisplayConfig;
use query::{Answer, AnswerTrace, Pipeline, PipelineError, Stage};

pub struct AppState {
    pipeline: Arc<Pipeline>,
    display: DisplayConfig,
}

impl AppState {
    pub fn new(pipeline: Pipeline, display: DisplayConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            display,
        }
    }
}

#[derive(Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub answer: String,
    pub trace: AnswerTrace,
}

impl AskResponse {
    pub fn from_answer(answer: Answer, display: &DisplayConfig) -> Self {
        Self {
            question: answer.question,
            translated_query: display.show_translation.then_some(answer.translated_query),
            context: display.show_context.then_some(answer.context),
            answer: answer.answer,
            trace: answer.trace,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct NoticeResponse {
    notice: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    stage: Option<Stage>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let pipeline = state.pipeline.clone();

    // The pipeline blocks, and its translation stage starts its own runtime.
    let result = tokio::task::spawn_blocking(move || pipeline.ask(&req.question)).await;

    match result {
        Ok(Ok(answer)) => Json(AskResponse::from_answer(answer, &state.display)).into_response(),
        Ok(Err(err @ PipelineError::EmptyQuestion)) => (
            StatusCode::BAD_REQUEST,
            Json(NoticeResponse {
                notice: err.user_message(),
            }),
        )
            .into_response(),
        Ok(Err(err)) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: err.user_message(),
                stage: err.stage(),
            }),
        )
            .into_response(),
        Err(join_error) => {
            tracing::error!(error = %join_error, "Pipeline worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "An error occurred: request worker failed".to_string(),
                    stage: None,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use index::{Embedder, Passage, RetrievalQuery, Retriever};
    use query::{PipelineSettings, Responder};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use translate::Translator;

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok("What is happiness?".to_string())
        }
    }

    struct UnitEmbedder;

    impl Embedder for UnitEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct BookRetriever {
        down: bool,
    }

    impl Retriever for BookRetriever {
        fn retrieve(&self, _query: &RetrievalQuery<'_>) -> Result<Vec<Passage>> {
            if self.down {
                anyhow::bail!("Failed to send query to Pinecone: connection refused");
            }
            Ok(vec![Passage {
                text: "Happiness is the absence of unhappiness.".to_string(),
                score: Some(0.9),
                rank: 0,
            }])
        }
    }

    struct CountingResponder(Arc<AtomicUsize>);

    impl Responder for CountingResponder {
        fn respond(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("Kebahagiaan adalah ketiadaan ketidakbahagiaan.".to_string())
        }
    }

    fn app(store_down: bool, display: DisplayConfig) -> (Router, Arc<AtomicUsize>) {
        let responses = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(
            Box::new(EchoTranslator),
            Box::new(UnitEmbedder),
            Box::new(BookRetriever { down: store_down }),
            Box::new(CountingResponder(responses.clone())),
            PipelineSettings::default(),
        );
        (router(Arc::new(AppState::new(pipeline, display))), responses)
    }

    async fn post_ask(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(false, DisplayConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_returns_answer_with_display_fields() {
        let display = DisplayConfig {
            show_translation: true,
            show_context: true,
        };
        let (app, responses) = app(false, display);

        let (status, body) = post_ask(app, r#"{"question":"Apa itu kebahagiaan?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Kebahagiaan adalah ketiadaan ketidakbahagiaan.");
        assert_eq!(body["translated_query"], "What is happiness?");
        assert_eq!(body["context"], "Happiness is the absence of unhappiness.");
        assert_eq!(body["trace"]["passages_retrieved"], 1);
        assert_eq!(responses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hidden_fields_are_omitted() {
        let (app, _) = app(false, DisplayConfig::default());

        let (_, body) = post_ask(app, r#"{"question":"Apa itu kebahagiaan?"}"#).await;

        assert!(body.get("translated_query").is_none());
        assert!(body.get("context").is_none());
    }

    #[tokio::test]
    async fn test_blank_question_is_a_notice() {
        let (app, responses) = app(false, DisplayConfig::default());

        let (status, body) = post_ask(app, r#"{"question":"   "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["notice"], query::EMPTY_QUESTION_NOTICE);
        assert_eq!(responses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stage_failure_names_stage() {
        let (app, responses) = app(true, DisplayConfig::default());

        let (status, body) = post_ask(app, r#"{"question":"Apa itu kebahagiaan?"}"#).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["stage"], "retrieval");
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("An error occurred: retrieval failed"));
        assert!(error.contains("connection refused"));
        assert_eq!(responses.load(Ordering::SeqCst), 0);
    }
}
