//! HTTP routes: outline synthesis, streaming report generation, export.
//!
//! The generation endpoint bridges the orchestrator's event channel onto a
//! chunked `application/x-ndjson` response: one serialized `GenerationEvent`
//! per line, terminated by the `done` event. Client disconnects drop the
//! body stream, which drops the channel receiver and cancels the run.

use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use reportant_core::{ExportFormat, Outline, ReportDocument, ReportantError, Topic, export};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct OutlineRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct OutlineResponse {
    pub template_text: String,
    pub outline: Outline,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub outline: Outline,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub title: String,
    pub content: String,
    /// `docx` (default) or `pdf`.
    #[serde(default)]
    pub format: Option<String>,
}

/// Error wrapper mapping the core taxonomy onto HTTP statuses.
pub struct ApiError(ReportantError);

impl From<ReportantError> for ApiError {
    fn from(err: ReportantError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReportantError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ReportantError::Llm(_) | ReportantError::Outline(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/report/outline", post(synthesize_outline))
        .route("/api/v1/report/generate", post(generate_report))
        .route("/api/v1/report/export", post(export_report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn synthesize_outline(
    State(state): State<AppState>,
    Json(request): Json<OutlineRequest>,
) -> Result<Json<OutlineResponse>, ApiError> {
    let topic = Topic::new(request.topic)?;
    let (template_text, outline) = state.synthesizer.synthesize(&topic).await?;
    Ok(Json(OutlineResponse {
        template_text,
        outline,
    }))
}

async fn generate_report(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let topic = Topic::new(request.topic)?;
    let rx = state.orchestrator.run(topic, request.outline)?;

    let stream = ReceiverStream::new(rx).map(|event| {
        let mut line = serde_json::to_string(&event).unwrap_or_else(|e| {
            error!(error = %e, "event serialization failed");
            r#"{"type":"error","payload":"event serialization failed"}"#.to_string()
        });
        line.push('\n');
        Ok::<Bytes, Infallible>(Bytes::from(line))
    });

    let headers = [(header::CONTENT_TYPE, "application/x-ndjson")];
    Ok((headers, Body::from_stream(stream)).into_response())
}

async fn export_report(Json(request): Json<ExportRequest>) -> Result<Response, ApiError> {
    let format: ExportFormat = match request.format.as_deref() {
        Some(s) => s.parse()?,
        None => ExportFormat::default(),
    };
    let document = ReportDocument {
        title: request.title,
        content: request.content,
    };
    let bytes = export(&document, format)?;

    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"report.{}\"", format.file_extension()),
        ),
    ];
    Ok((headers, bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use reportant_core::{MockLlmProvider, ReportantConfig};
    use std::sync::Arc;
    use tower::ServiceExt;

    const OUTLINE_RESPONSE: &str = r#"제 1장 서론
1.1. 연구의 배경 및 필요성

```json
{
  "title": "국내 탄소 배출 현황 보고서",
  "chapters": [
    { "heading": "서론", "sections": [{ "heading": "1.1. 연구의 배경 및 필요성" }] }
  ]
}
```"#;

    fn app(provider: Arc<MockLlmProvider>) -> Router {
        let state = AppState::with_providers(&ReportantConfig::default(), provider).unwrap();
        router(state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_outline_endpoint() {
        let provider = Arc::new(MockLlmProvider::with_response(OUTLINE_RESPONSE));
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/outline",
                serde_json::json!({ "topic": "국내 탄소 배출 현황" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["template_text"].as_str().unwrap().contains("제 1장"));
        assert_eq!(body["outline"]["title"], "국내 탄소 배출 현황 보고서");
        assert_eq!(
            body["outline"]["chapters"][0]["sections"][0]["heading"],
            "1.1. 연구의 배경 및 필요성"
        );
    }

    #[tokio::test]
    async fn test_outline_endpoint_rejects_empty_topic() {
        let provider = Arc::new(MockLlmProvider::new());
        let response = app(provider.clone())
            .oneshot(post_json(
                "/api/v1/report/outline",
                serde_json::json!({ "topic": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        // Rejected before any provider call.
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_outline_endpoint_maps_malformed_upstream() {
        let provider = Arc::new(MockLlmProvider::with_response("JSON 없는 응답"));
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/outline",
                serde_json::json!({ "topic": "주제" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_generate_endpoint_streams_ndjson() {
        let provider = Arc::new(MockLlmProvider::new());
        provider.queue_text("질문?");
        provider.queue_text("본문 내용");

        let outline = serde_json::json!({
            "title": "보고서",
            "chapters": [
                { "heading": "서론", "sections": [{ "heading": "1.1. 배경" }] }
            ]
        });
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/generate",
                serde_json::json!({ "topic": "주제", "outline": outline }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-ndjson"
        );

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        let events: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(events.first().unwrap()["type"], "section_title");
        assert_eq!(events.first().unwrap()["payload"], "1.1. 배경");
        assert!(events.iter().any(|e| e["type"] == "content"));
        let last = events.last().unwrap();
        assert_eq!(last["type"], "done");
        assert_eq!(last["payload"], "보고서 생성이 완료되었습니다.");
    }

    #[tokio::test]
    async fn test_generate_endpoint_rejects_blank_section() {
        let provider = Arc::new(MockLlmProvider::new());
        let outline = serde_json::json!({
            "title": "보고서",
            "chapters": [
                { "heading": "서론", "sections": [{ "heading": "  " }] }
            ]
        });
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/generate",
                serde_json::json!({ "topic": "주제", "outline": outline }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_endpoint_docx_default() {
        let provider = Arc::new(MockLlmProvider::new());
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/export",
                serde_json::json!({ "title": "나의 첫 보고서", "content": "본문입니다." }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("wordprocessingml")
        );
        let bytes = body_bytes(response).await;
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_export_endpoint_pdf() {
        let provider = Arc::new(MockLlmProvider::new());
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/export",
                serde_json::json!({
                    "title": "나의 첫 보고서",
                    "content": "본문입니다.",
                    "format": "pdf"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let bytes = body_bytes(response).await;
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[tokio::test]
    async fn test_export_endpoint_rejects_unknown_format() {
        let provider = Arc::new(MockLlmProvider::new());
        let response = app(provider)
            .oneshot(post_json(
                "/api/v1/report/export",
                serde_json::json!({ "title": "t", "content": "c", "format": "hwp" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
