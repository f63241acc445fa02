//! HTTP surface for DocLens.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `GET /health` – Liveness probe; always reports healthy.
//! - `POST /upload` – Analyze one uploaded document (multipart `file` part plus optional
//!   `query` and `category` parts). Returns `{"result", "extracted_text"}`.
//! - `POST /analyze_multiple` – Analyze several uploaded documents jointly (repeated
//!   `files` parts). Returns `{"result", "document_count"}`.
//! - `POST /analyze_text` – Analyze raw text from a JSON body. Returns `{"result"}`.
//! - `GET /metrics` – Observe analysis counters.
//!
//! Caller-fixable problems (missing input, unsupported media types) map to 400 with a
//! JSON `detail` body; pipeline failures map to 500 carrying the underlying diagnostic.
//! Media types are checked here, before the pipeline runs, so a rejected upload never
//! reaches a model provider.

use crate::extract::MediaType;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    AnalysisApi, DocumentPayload, PipelineError, ValidationError,
};
use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the analysis API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AnalysisApi + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload::<S>))
        .route("/analyze_multiple", post(analyze_multiple::<S>))
        .route("/analyze_text", post(analyze_text::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Model-produced analysis text.
    result: String,
    /// Plain text extracted from the uploaded document.
    extracted_text: String,
}

/// Analyze a single uploaded document.
async fn upload<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: AnalysisApi,
{
    let FormData {
        mut documents,
        query,
        category,
    } = read_form_data(multipart).await?;
    if documents.is_empty() {
        return Err(ValidationError::MissingFile.into());
    }
    let document = documents.remove(0);

    let analysis = service
        .analyze_documents(vec![document], query, category)
        .await?;
    tracing::info!(
        chunks = analysis.outcome.chunk_count,
        context_chunks = analysis.outcome.context_chunks,
        "Upload analysis completed"
    );
    Ok(Json(UploadResponse {
        result: analysis.outcome.result,
        extracted_text: analysis.extracted_text,
    }))
}

/// Success response for the `POST /analyze_multiple` endpoint.
#[derive(Serialize)]
struct MultiAnalysisResponse {
    /// Model-produced analysis text covering all documents.
    result: String,
    /// Number of documents analyzed jointly.
    document_count: usize,
}

/// Analyze several uploaded documents as one corpus.
async fn analyze_multiple<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<MultiAnalysisResponse>, AppError>
where
    S: AnalysisApi,
{
    let FormData {
        documents,
        query,
        category,
    } = read_form_data(multipart).await?;
    if documents.is_empty() {
        return Err(ValidationError::NoFilesUploaded.into());
    }

    let analysis = service.analyze_documents(documents, query, category).await?;
    tracing::info!(
        documents = analysis.document_count,
        chunks = analysis.outcome.chunk_count,
        "Multi-document analysis completed"
    );
    Ok(Json(MultiAnalysisResponse {
        result: analysis.outcome.result,
        document_count: analysis.document_count,
    }))
}

/// Request body for the `POST /analyze_text` endpoint.
#[derive(Deserialize)]
struct TextAnalysisRequest {
    /// Raw text to analyze.
    text: String,
    /// Optional custom query guiding retrieval and generation.
    #[serde(default)]
    query: Option<String>,
    /// Optional analysis category (defaults to `summary`).
    #[serde(default)]
    category: Option<String>,
}

/// Success response for the `POST /analyze_text` endpoint.
#[derive(Serialize)]
struct TextAnalysisResponse {
    /// Model-produced analysis text.
    result: String,
}

/// Analyze raw text posted as JSON.
async fn analyze_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<TextAnalysisRequest>,
) -> Result<Json<TextAnalysisResponse>, AppError>
where
    S: AnalysisApi,
{
    if request.text.trim().is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let outcome = service
        .analyze_text(request.text, request.query, request.category)
        .await?;
    tracing::info!(
        chunks = outcome.chunk_count,
        context_chunks = outcome.context_chunks,
        "Text analysis completed"
    );
    Ok(Json(TextAnalysisResponse {
        result: outcome.result,
    }))
}

/// Return a concise metrics snapshot with analysis counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: AnalysisApi,
{
    Json(service.metrics_snapshot())
}

/// Fields collected from a multipart upload body.
#[derive(Default)]
struct FormData {
    documents: Vec<DocumentPayload>,
    query: Option<String>,
    category: Option<String>,
}

/// Drain a multipart body into document payloads and optional text fields.
///
/// Media types are validated as each file part is read, so an unsupported upload fails
/// before any payload reaches the pipeline. Unknown parts are ignored.
async fn read_form_data(mut multipart: Multipart) -> Result<FormData, ValidationError> {
    let mut form = FormData::default();
    while let Some(field) = multipart.next_field().await.map_err(as_multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") | Some("files") => {
                let mime = field.content_type().map(str::to_string).unwrap_or_default();
                let media_type = MediaType::from_mime(&mime)
                    .ok_or(ValidationError::UnsupportedFormat(mime))?;
                let content = field.bytes().await.map_err(as_multipart_error)?;
                form.documents.push(DocumentPayload {
                    content: content.to_vec(),
                    media_type,
                });
            }
            Some("query") => {
                form.query = non_empty(field.text().await.map_err(as_multipart_error)?);
            }
            Some("category") => {
                form.category = non_empty(field.text().await.map_err(as_multipart_error)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

fn as_multipart_error(error: MultipartError) -> ValidationError {
    ValidationError::Multipart(error.to_string())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %detail, "Request failed");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::extract::MediaType;
    use crate::metrics::MetricsSnapshot;
    use crate::model::GenerationClientError;
    use crate::processing::{
        AnalysisApi, AnalysisOutcome, DocumentAnalysisOutcome, DocumentPayload, PipelineError,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "test-boundary";

    #[derive(Clone, Debug)]
    struct TextCall {
        text: String,
        query: Option<String>,
        category: Option<String>,
    }

    #[derive(Clone, Debug)]
    struct DocumentCall {
        documents: Vec<DocumentPayload>,
        query: Option<String>,
        category: Option<String>,
    }

    struct StubAnalysisService {
        text_calls: Mutex<Vec<TextCall>>,
        document_calls: Mutex<Vec<DocumentCall>>,
        fail: bool,
    }

    impl StubAnalysisService {
        fn new() -> Self {
            Self {
                text_calls: Mutex::new(Vec::new()),
                document_calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        async fn text_calls(&self) -> Vec<TextCall> {
            self.text_calls.lock().await.clone()
        }

        async fn document_calls(&self) -> Vec<DocumentCall> {
            self.document_calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl AnalysisApi for StubAnalysisService {
        async fn analyze_text(
            &self,
            text: String,
            query: Option<String>,
            category: Option<String>,
        ) -> Result<AnalysisOutcome, PipelineError> {
            self.text_calls.lock().await.push(TextCall {
                text,
                query,
                category,
            });
            if self.fail {
                return Err(PipelineError::Generation(
                    GenerationClientError::GenerationFailed("model quota exhausted".into()),
                ));
            }
            Ok(AnalysisOutcome {
                result: "stub analysis".into(),
                chunk_count: 1,
                context_chunks: 1,
            })
        }

        async fn analyze_documents(
            &self,
            documents: Vec<DocumentPayload>,
            query: Option<String>,
            category: Option<String>,
        ) -> Result<DocumentAnalysisOutcome, PipelineError> {
            let document_count = documents.len();
            self.document_calls.lock().await.push(DocumentCall {
                documents,
                query,
                category,
            });
            Ok(DocumentAnalysisOutcome {
                outcome: AnalysisOutcome {
                    result: "stub analysis".into(),
                    chunk_count: 1,
                    context_chunks: 1,
                },
                extracted_text: "extracted text".into(),
                document_count,
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                requests_completed: 0,
                documents_analyzed: 0,
                chunks_indexed: 0,
            }
        }
    }

    fn file_part(name: &str, content_type: &str, body: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"doc\"\r\nContent-Type: {content_type}\r\n\r\n{body}\r\n"
        )
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn multipart_request(uri: &str, parts: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!("{parts}--{BOUNDARY}--\r\n")))
            .expect("request")
    }

    fn json_request(uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = create_router(Arc::new(StubAnalysisService::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn analyze_text_returns_result() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let payload = json!({
            "text": "The sky is blue.",
            "query": "what color?",
            "category": "keywords"
        });
        let response = app
            .oneshot(json_request("/analyze_text", payload))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["result"], "stub analysis");

        let calls = service.text_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "The sky is blue.");
        assert_eq!(calls[0].query.as_deref(), Some("what color?"));
        assert_eq!(calls[0].category.as_deref(), Some("keywords"));
    }

    #[tokio::test]
    async fn analyze_text_rejects_blank_text() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(json_request("/analyze_text", json!({ "text": "   " })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["detail"], "No text provided");
        assert!(service.text_calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_accepts_plaintext_file() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let parts = format!(
            "{}{}",
            file_part("file", "text/plain", "hello world"),
            text_part("category", "sentiment")
        );
        let response = app
            .oneshot(multipart_request("/upload", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["result"], "stub analysis");
        assert_eq!(json["extracted_text"], "extracted text");

        let calls = service.document_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].documents.len(), 1);
        assert_eq!(calls[0].documents[0].media_type, MediaType::Plaintext);
        assert_eq!(calls[0].documents[0].content, b"hello world");
        assert_eq!(calls[0].category.as_deref(), Some("sentiment"));
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request("/upload", &text_part("query", "anything")))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["detail"], "No file uploaded");
        assert!(service.document_calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_media_type() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request(
                "/upload",
                &file_part("file", "image/png", "binary"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["detail"], "Unsupported file type: image/png");
        assert!(service.document_calls().await.is_empty());
    }

    #[tokio::test]
    async fn analyze_multiple_reports_document_count() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let parts = format!(
            "{}{}",
            file_part("files", "text/plain", "first document"),
            file_part("files", "text/plain", "second document")
        );
        let response = app
            .oneshot(multipart_request("/analyze_multiple", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["result"], "stub analysis");
        assert_eq!(json["document_count"], 2);

        let calls = service.document_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].documents.len(), 2);
    }

    #[tokio::test]
    async fn analyze_multiple_without_files_is_rejected() {
        let service = Arc::new(StubAnalysisService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request(
                "/analyze_multiple",
                &text_part("category", "keywords"),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["detail"], "No files uploaded");
    }

    #[tokio::test]
    async fn pipeline_failures_map_to_internal_errors() {
        let service = Arc::new(StubAnalysisService::failing());
        let app = create_router(service);

        let response = app
            .oneshot(json_request("/analyze_text", json!({ "text": "some text" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        let detail = json["detail"].as_str().expect("detail string");
        assert!(detail.contains("model quota exhausted"));
    }

    #[tokio::test]
    async fn metrics_endpoint_reports_counters() {
        let app = create_router(Arc::new(StubAnalysisService::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["requests_completed"], 0);
        assert_eq!(json["chunks_indexed"], 0);
    }
}
