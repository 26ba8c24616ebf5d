//! HTTP Middleware
//!
//! 访问日志：按状态码分级记录方法、路径、状态与耗时

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// 客户端主动断开时的状态码
const CLIENT_CLOSED: u16 = 499;

/// 响应对应的日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// 正常完成，仅 debug 输出
    Quiet,
    /// 客户端断开，不算错误
    Cancelled,
    /// 4xx
    Rejected,
    /// 5xx，包括上游失败映射出的 502/503
    Failed,
}

impl AccessLevel {
    pub fn for_status(status: StatusCode) -> Self {
        if status.as_u16() == CLIENT_CLOSED {
            AccessLevel::Cancelled
        } else if status.is_server_error() {
            AccessLevel::Failed
        } else if status.is_client_error() {
            AccessLevel::Rejected
        } else {
            AccessLevel::Quiet
        }
    }
}

/// 访问日志中间件
///
/// 流式合成的耗时只统计到响应头提交为止，音频体仍在后台生成
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match AccessLevel::for_status(response.status()) {
        AccessLevel::Quiet => {
            tracing::debug!(%method, %path, status, elapsed_ms, "Request completed")
        }
        AccessLevel::Cancelled => {
            tracing::info!(%method, %path, elapsed_ms, "Client closed request")
        }
        AccessLevel::Rejected => {
            tracing::warn!(%method, %path, status, elapsed_ms, "Request rejected")
        }
        AccessLevel::Failed => {
            tracing::error!(%method, %path, status, elapsed_ms, "Request failed")
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::error::ApiError;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route(
                "/audio",
                post(|| async { ([(header::CONTENT_TYPE, "audio/mpeg")], "ID3mp3").into_response() }),
            )
            .route(
                "/rejected",
                post(|| async { ApiError::BadRequest("input is empty".to_string()) }),
            )
            .route(
                "/upstream",
                post(|| async { ApiError::BadGateway("synthesis returned 500".to_string()) }),
            )
            .route("/closed", post(|| async { ApiError::ClientClosed }))
            .layer(axum::middleware::from_fn(access_log_middleware))
    }

    async fn send(uri: &str) -> Response {
        router()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[test]
    fn test_level_for_status() {
        assert_eq!(AccessLevel::for_status(StatusCode::OK), AccessLevel::Quiet);
        assert_eq!(AccessLevel::for_status(StatusCode::BAD_REQUEST), AccessLevel::Rejected);
        assert_eq!(AccessLevel::for_status(StatusCode::BAD_GATEWAY), AccessLevel::Failed);
        assert_eq!(
            AccessLevel::for_status(StatusCode::SERVICE_UNAVAILABLE),
            AccessLevel::Failed
        );
        assert_eq!(
            AccessLevel::for_status(StatusCode::from_u16(499).unwrap()),
            AccessLevel::Cancelled
        );
    }

    #[tokio::test]
    async fn test_audio_body_untouched() {
        let response = send("/audio").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ID3mp3");
    }

    #[tokio::test]
    async fn test_error_body_untouched() {
        let response = send("/upstream").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "upstream_error");
        assert_eq!(body["error"]["message"], "synthesis returned 500");
    }

    #[tokio::test]
    async fn test_rejected_and_closed_statuses() {
        assert_eq!(send("/rejected").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(send("/closed").await.status().as_u16(), 499);
    }
}
